//! Expression parsing using Pratt parsing (precedence climbing).
//!
//! Binding powers come from the operator definitions in [`crate::ast::ops`].

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::node::Ident;
use crate::ast::ops::{AssignOp, BinaryOp, PostfixOp, UnaryOp};
use crate::lexer::{Token, TokenKind};
use bumpalo::collections::Vec as BVec;
use hostscript_core::{ParseError, ParseErrorKind, Span};

impl<'ast> Parser<'ast> {
    /// Parse an expression with a minimum binding power.
    ///
    /// Only operators binding at least as tightly as `min_bp` are consumed.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        self.nested(|p| p.parse_expr_bp(min_bp))
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.peek().kind;

            if let Some(postfix_op) = PostfixOp::from_token(kind) {
                if PostfixOp::binding_power() < min_bp {
                    break;
                }
                let op_token = self.advance();
                let span = lhs.span().merge(op_token.span);
                lhs = self.arena.alloc(Expr::Postfix(self.arena.alloc(PostfixExpr {
                    operand: lhs,
                    op: postfix_op,
                    span,
                })));
                continue;
            }

            if kind == TokenKind::LeftBracket {
                if PostfixOp::binding_power() < min_bp {
                    break;
                }
                lhs = self.parse_index(lhs)?;
                continue;
            }

            if kind == TokenKind::LeftParen {
                let token = *self.peek();
                return Err(ParseError::new(
                    ParseErrorKind::InvalidExpression,
                    token.span,
                    "only named functions can be called",
                ));
            }

            if let Some(assign_op) = AssignOp::from_token(kind) {
                let (l_bp, r_bp) = AssignOp::binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr(r_bp)?;
                let span = lhs.span().merge(rhs.span());
                lhs = self.arena.alloc(Expr::Assign(self.arena.alloc(AssignExpr {
                    target: lhs,
                    op: assign_op,
                    value: rhs,
                    span,
                })));
                continue;
            }

            if let Some(bin_op) = BinaryOp::from_token(kind) {
                let (l_bp, r_bp) = bin_op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr(r_bp)?;
                let span = lhs.span().merge(rhs.span());
                lhs = self.arena.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
                    left: lhs,
                    op: bin_op,
                    right: rhs,
                    span,
                })));
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// Parse a prefix expression (the start of an expression).
    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = *self.peek();

        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("integer literal '{}' is out of range", token.lexeme),
                    )
                })?;
                Ok(self.literal(LiteralKind::Int(value), token.span))
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("invalid float literal '{}'", token.lexeme),
                    )
                })?;
                Ok(self.literal(LiteralKind::Float(value), token.span))
            }
            TokenKind::StringLiteral => {
                self.advance();
                let text = self.unescape_string(&token)?;
                Ok(self.literal(LiteralKind::String(text), token.span))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(self.literal(LiteralKind::Bool(token.kind == TokenKind::True), token.span))
            }
            TokenKind::Identifier => self.parse_ident_or_call(),
            TokenKind::LeftParen if self.peek_nth(1).kind.is_type_keyword() => self.parse_cast(),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RightParen)?;
                Ok(self.arena.alloc(Expr::Paren(self.arena.alloc(ParenExpr {
                    expr: inner,
                    span: token.span.merge(close.span),
                }))))
            }
            TokenKind::LeftBrace => self.parse_init_list(),
            kind => {
                if let Some(op) = UnaryOp::from_token(kind) {
                    self.advance();
                    let operand = self.parse_expr(UnaryOp::binding_power())?;
                    let span = token.span.merge(operand.span());
                    return Ok(self.arena.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
                        op,
                        operand,
                        span,
                    }))));
                }
                Err(ParseError::expected_expression(token.span, &token.describe()))
            }
        }
    }

    fn literal(&self, kind: LiteralKind<'ast>, span: Span) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::Literal(LiteralExpr { kind, span }))
    }

    /// Parse `IDENT ('.' IDENT)*`, followed by an optional argument list.
    fn parse_ident_or_call(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let first = self.expect(TokenKind::Identifier)?;
        let mut path = BVec::new_in(self.arena);
        path.push(Ident::new(first.lexeme, first.span));

        while self.check(TokenKind::Dot) {
            self.advance();
            let segment = self.expect(TokenKind::Identifier)?;
            path.push(Ident::new(segment.lexeme, segment.span));
        }

        let span = first.span.merge(self.previous_span());
        let callee = IdentExpr {
            path: path.into_bump_slice(),
            span,
        };

        if !self.check(TokenKind::LeftParen) {
            return Ok(self.arena.alloc(Expr::Ident(callee)));
        }

        self.advance();
        let mut args = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr(0)?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightParen)?;

        Ok(self.arena.alloc(Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args: args.into_bump_slice(),
            span: span.merge(close.span),
        }))))
    }

    /// Parse `'(' type ')' expr`.
    fn parse_cast(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let open = self.expect(TokenKind::LeftParen)?;
        let target = self.parse_type()?;
        self.expect(TokenKind::RightParen)?;
        let expr = self.parse_expr(UnaryOp::binding_power())?;
        let span = open.span.merge(expr.span());
        Ok(self.arena.alloc(Expr::Cast(self.arena.alloc(CastExpr { target, expr, span }))))
    }

    fn parse_index(&mut self, base: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftBracket)?;
        let index = self.parse_expr(0)?;
        let close = self.expect(TokenKind::RightBracket)?;
        let span = base.span().merge(close.span);
        Ok(self.arena.alloc(Expr::Index(self.arena.alloc(IndexExpr { base, index, span }))))
    }

    /// Parse `'{' (expr (',' expr)* ','?)? '}'`.
    fn parse_init_list(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut elements = BVec::new_in(self.arena);

        while !self.check(TokenKind::RightBrace) {
            elements.push(self.parse_expr(0)?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBrace)?;

        Ok(self.arena.alloc(Expr::InitList(InitListExpr {
            elements: elements.into_bump_slice(),
            span: open.span.merge(close.span),
        })))
    }

    /// Strip the quotes from a string literal and process its escapes.
    fn unescape_string(&self, token: &Token<'ast>) -> Result<&'ast str, ParseError> {
        let raw = token.lexeme;
        let body = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(raw);

        if !body.contains('\\') {
            return Ok(self.arena.alloc_str(body));
        }

        let mut out = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                other => {
                    let shown = other.map(|c| format!("\\{c}")).unwrap_or_else(|| "\\".to_string());
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidEscapeSequence,
                        token.span,
                        format!("unknown escape sequence '{shown}'"),
                    ));
                }
            }
        }
        Ok(self.arena.alloc_str(&out))
    }
}
