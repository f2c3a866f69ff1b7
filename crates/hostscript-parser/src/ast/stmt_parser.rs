//! Statement parsing.
//!
//! Implements parsing of blocks, declarations, control flow, jumps and
//! top-level function definitions.

use super::parser::{MAX_NESTING_DEPTH, Parser};
use crate::ast::node::{Ident, TypeExpr};
use crate::ast::stmt::*;
use crate::lexer::TokenKind;
use bumpalo::collections::Vec as BVec;
use hostscript_core::{ParseError, ParseErrorKind};

impl<'ast> Parser<'ast> {
    /// Parse a top-level item: a function definition or a statement.
    pub fn parse_item(&mut self) -> Result<Stmt<'ast>, ParseError> {
        self.parse_statement_in(true)
    }

    /// Parse a statement nested inside a block or control-flow construct.
    pub fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        self.parse_statement_in(false)
    }

    fn parse_statement_in(&mut self, top_level: bool) -> Result<Stmt<'ast>, ParseError> {
        self.nested(|p| p.parse_statement_kind(top_level))
    }

    fn parse_statement_kind(&mut self, top_level: bool) -> Result<Stmt<'ast>, ParseError> {
        let token = *self.peek();

        match token.kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                self.advance();
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break(BreakStmt {
                    span: token.span.merge(end.span),
                }))
            }
            TokenKind::Continue => {
                self.advance();
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Continue(ContinueStmt {
                    span: token.span.merge(end.span),
                }))
            }
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            kind if kind.is_type_keyword() => self.parse_declaration(top_level),
            _ => self.parse_expr_stmt(),
        }
    }

    /// Parse an expression statement or the empty statement `;`.
    fn parse_expr_stmt(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start_span = self.peek().span;

        if self.check(TokenKind::Semicolon) {
            let span = self.advance().span;
            return Ok(Stmt::Expr(ExprStmt { expr: None, span }));
        }

        let expr = self.parse_expr(0)?;
        let end_span = self.expect(TokenKind::Semicolon)?.span;

        Ok(Stmt::Expr(ExprStmt {
            expr: Some(expr),
            span: start_span.merge(end_span),
        }))
    }

    /// Parse a statement starting with a type: a variable declaration, or a
    /// function definition when `type IDENT (` follows.
    fn parse_declaration(&mut self, top_level: bool) -> Result<Stmt<'ast>, ParseError> {
        let ty = self.parse_type()?;

        if self.check(TokenKind::Identifier) && self.peek_nth(1).kind == TokenKind::LeftParen {
            let name_span = self.peek().span;
            let func = self.parse_function(ty)?;
            if !top_level {
                self.error(
                    ParseErrorKind::NestedFunction,
                    name_span,
                    format!("function '{}' must be defined at the top level", func.name.name),
                );
            }
            return Ok(Stmt::Function(func));
        }

        let decl = self.parse_var_decl_rest(ty)?;
        let end = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::VarDecl(VarDeclStmt {
            span: decl.span.merge(end.span),
            ..decl
        }))
    }

    /// Parse the declarators following an already-parsed type.
    ///
    /// Grammar: `declarator (',' declarator)*` without the trailing `;`.
    fn parse_var_decl_rest(&mut self, ty: TypeExpr) -> Result<VarDeclStmt<'ast>, ParseError> {
        let mut vars = BVec::new_in(self.arena);
        vars.push(self.parse_var_declarator()?);
        while self.eat(TokenKind::Comma).is_some() {
            vars.push(self.parse_var_declarator()?);
        }

        Ok(VarDeclStmt {
            ty,
            vars: vars.into_bump_slice(),
            span: ty.span.merge(self.previous_span()),
        })
    }

    /// Grammar: `IDENT ('[' expr? ']')* ('=' expr)?`
    fn parse_var_declarator(&mut self) -> Result<VarDeclarator<'ast>, ParseError> {
        let name_token = self.expect(TokenKind::Identifier)?;
        let name = Ident::new(name_token.lexeme, name_token.span);

        let mut dims = BVec::new_in(self.arena);
        while self.check(TokenKind::LeftBracket) {
            if dims.len() >= MAX_NESTING_DEPTH {
                return Err(self.nesting_overflow());
            }
            self.advance();
            if self.eat(TokenKind::RightBracket).is_some() {
                dims.push(None);
            } else {
                dims.push(Some(self.parse_expr(0)?));
                self.expect(TokenKind::RightBracket)?;
            }
        }

        let init = if self.eat(TokenKind::Equal).is_some() {
            Some(self.parse_expr(0)?)
        } else {
            None
        };

        Ok(VarDeclarator {
            name,
            dims: dims.into_bump_slice(),
            init,
            span: name_token.span.merge(self.previous_span()),
        })
    }

    /// Grammar: `type IDENT '(' (param (',' param)*)? ')' block`
    fn parse_function(&mut self, return_type: TypeExpr) -> Result<&'ast FunctionDecl<'ast>, ParseError> {
        let name_token = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::LeftParen)?;

        let mut params = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                let mut ty = self.parse_type()?;
                let param_name = self.expect(TokenKind::Identifier)?;
                ty.array_rank += self.parse_empty_dims()?;
                params.push(Param {
                    ty,
                    name: Ident::new(param_name.lexeme, param_name.span),
                    span: ty.span.merge(self.previous_span()),
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        let body = self.parse_block()?;
        Ok(self.arena.alloc(FunctionDecl {
            return_type,
            name: Ident::new(name_token.lexeme, name_token.span),
            params: params.into_bump_slice(),
            body,
            span: return_type.span.merge(body.span),
        }))
    }

    /// Parse a braced block, recovering from errors in its statements.
    pub fn parse_block(&mut self) -> Result<Block<'ast>, ParseError> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut stmts = BVec::new_in(self.arena);

        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            let start = self.position;
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize(start);
                }
            }
        }

        let close = self.expect(TokenKind::RightBrace)?;
        Ok(Block {
            stmts: stmts.into_bump_slice(),
            span: open.span.merge(close.span),
        })
    }

    /// Grammar: `'if' '(' expr ')' statement ('else' statement)?`
    fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;

        let then_stmt = self.parse_statement()?;
        let else_stmt = if self.eat(TokenKind::Else).is_some() {
            let stmt = self.parse_statement()?;
            Some(self.alloc_stmt(stmt))
        } else {
            None
        };

        let end_span = else_stmt.map(|s| s.span()).unwrap_or_else(|| then_stmt.span());
        Ok(Stmt::If(self.arena.alloc(IfStmt {
            condition,
            then_stmt: self.alloc_stmt(then_stmt),
            else_stmt,
            span: start.span.merge(end_span),
        })))
    }

    /// Grammar: `'while' '(' expr ')' statement`
    fn parse_while(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::While)?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_statement()?;

        Ok(Stmt::While(self.arena.alloc(WhileStmt {
            condition,
            body: self.alloc_stmt(body),
            span: start.span.merge(body.span()),
        })))
    }

    /// Grammar: `'for' '(' (vardecl | expr)? ';' expr? ';' expr? ')' statement`
    fn parse_for(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::For)?;
        self.expect(TokenKind::LeftParen)?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else if self.peek().kind.is_type_keyword() {
            let ty = self.parse_type()?;
            Some(ForInit::VarDecl(self.parse_var_decl_rest(ty)?))
        } else {
            Some(ForInit::Expr(self.parse_expr(0)?))
        };
        self.expect(TokenKind::Semicolon)?;

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        self.expect(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        self.expect(TokenKind::RightParen)?;

        let body = self.parse_statement()?;
        Ok(Stmt::For(self.arena.alloc(ForStmt {
            init,
            condition,
            update,
            body: self.alloc_stmt(body),
            span: start.span.merge(body.span()),
        })))
    }

    /// Grammar: `'return' expr? ';'`
    fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        let end = self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Return(ReturnStmt {
            value,
            span: start.span.merge(end.span),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;
    use hostscript_core::ParseErrorKind;

    #[test]
    fn summation_script() {
        let arena = Bump::new();
        let source = r#"
            int sum = 0;
            int n = LOOP_MAX;
            for (int i = 1; i <= n; i++) {
                sum += i;
            }
            output(sum);
        "#;
        let script = Parser::parse(source, &arena).unwrap();
        assert_eq!(script.stmts().len(), 4);
        let Stmt::For(for_stmt) = script.stmts()[2] else { panic!("expected for") };
        assert!(matches!(for_stmt.init, Some(ForInit::VarDecl(_))));
        assert!(for_stmt.condition.is_some());
        assert!(for_stmt.update.is_some());
        assert!(matches!(for_stmt.body, Stmt::Block(_)));
    }

    #[test]
    fn multiple_declarators_and_arrays() {
        let arena = Bump::new();
        let script = Parser::parse("int a = 1, b[3], c[] = {1, 2};", &arena).unwrap();
        let Stmt::VarDecl(decl) = script.stmts()[0] else { panic!("expected decl") };
        assert_eq!(decl.vars.len(), 3);
        assert!(decl.vars[0].init.is_some());
        assert_eq!(decl.vars[1].dims.len(), 1);
        assert!(decl.vars[1].dims[0].is_some());
        assert_eq!(decl.vars[2].dims, &[None]);
    }

    #[test]
    fn function_definition() {
        let arena = Bump::new();
        let script = Parser::parse("float scale(float x, int[] v) { return x; }", &arena).unwrap();
        let Stmt::Function(func) = script.stmts()[0] else { panic!("expected function") };
        assert_eq!(func.name.name, "scale");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].ty.array_rank, 1);
        assert_eq!(func.body.stmts.len(), 1);
    }

    #[test]
    fn nested_function_is_rejected() {
        let arena = Bump::new();
        let errors = Parser::parse("void f() { int g() { return 1; } }", &arena).unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::NestedFunction);
    }

    #[test]
    fn if_else_chain() {
        let arena = Bump::new();
        let script = Parser::parse("if (a) b(); else if (c) d(); else { e(); }", &arena).unwrap();
        let Stmt::If(stmt) = script.stmts()[0] else { panic!("expected if") };
        assert!(matches!(stmt.else_stmt, Some(Stmt::If(_))));
    }

    #[test]
    fn empty_for_header() {
        let arena = Bump::new();
        let script = Parser::parse("for (;;) { break; }", &arena).unwrap();
        let Stmt::For(stmt) = script.stmts()[0] else { panic!("expected for") };
        assert!(stmt.init.is_none() && stmt.condition.is_none() && stmt.update.is_none());
    }

    #[test]
    fn missing_closing_brace() {
        let arena = Bump::new();
        let errors = Parser::parse("for (int i = 0; i < 3; i++) { output(i);", &arena).unwrap_err();
        let first = errors.first().unwrap();
        assert_eq!(first.kind, ParseErrorKind::ExpectedToken);
        assert_eq!(first.message, "expected '}', found end of file");
    }

    #[test]
    fn error_location_and_expected_vs_found() {
        let arena = Bump::new();
        let errors = Parser::parse("int x = 1\nint y = 2;", &arena).unwrap_err();
        let first = errors.first().unwrap();
        assert_eq!(first.line(), 2);
        assert_eq!(first.column(), 1);
        assert_eq!(first.message, "expected ';', found 'int'");
    }

    #[test]
    fn recovers_and_reports_every_error() {
        let arena = Bump::new();
        let source = "int x = ;\nint y = 2;\nfloat z = * 3;\n";
        let (script, errors) = Parser::parse_lenient(source, &arena);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.iter().map(|e| e.line()).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(script.stmts().len(), 1);
    }

    #[test]
    fn recovery_inside_blocks() {
        let arena = Bump::new();
        let (script, errors) = Parser::parse_lenient("void f() { x = ; y = 1; }\nint z;", &arena);
        assert_eq!(errors.len(), 1);
        assert_eq!(script.stmts().len(), 2);
        let Stmt::Function(func) = script.stmts()[0] else { panic!("expected function") };
        assert_eq!(func.body.stmts.len(), 1);
    }

    #[test]
    fn stray_closing_brace_terminates() {
        let arena = Bump::new();
        let errors = Parser::parse("} } output(1);", &arena).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn comments_are_ignored() {
        let arena = Bump::new();
        let script = Parser::parse("// header\nint x = 1; /* block\ncomment */ x += 2;", &arena).unwrap();
        assert_eq!(script.stmts().len(), 2);
    }
}
