//! Statement resolution.

use hostscript_core::{ResolveError, ScriptType};
use hostscript_parser::Script;
use hostscript_parser::ast::{ForInit, ForStmt, IfStmt, ReturnStmt, Stmt, VarDeclStmt, WhileStmt};

use super::{ResolveFlags, Resolver, Result, contains_void};
use crate::program::{Init, RStmt};

impl<'r> Resolver<'r> {
    /// Resolve the top-level statements of one script. Function definitions
    /// are resolved where they stand and leave an empty statement behind.
    pub(super) fn resolve_top_level(&mut self, script: Script<'_>) -> Result<Vec<RStmt>> {
        self.resolve_stmts(script.stmts())
    }

    pub(super) fn resolve_stmts(&mut self, stmts: &[Stmt<'_>]) -> Result<Vec<RStmt>> {
        stmts.iter().map(|stmt| self.resolve_stmt(stmt)).collect()
    }

    fn resolve_stmt(&mut self, stmt: &Stmt<'_>) -> Result<RStmt> {
        self.nested(stmt.span(), |r| r.resolve_stmt_kind(stmt))
    }

    fn resolve_stmt_kind(&mut self, stmt: &Stmt<'_>) -> Result<RStmt> {
        match stmt {
            Stmt::Expr(expr_stmt) => match expr_stmt.expr {
                Some(expr) => Ok(RStmt::Expr(self.resolve_expr(expr)?)),
                None => Ok(RStmt::Empty),
            },
            Stmt::VarDecl(decl) => self.resolve_var_decl(decl),
            Stmt::Return(ret) => self.resolve_return(ret),
            Stmt::Break(brk) => {
                if !self.flags.contains(ResolveFlags::IN_LOOP) {
                    return Err(ResolveError::BreakOutsideLoop { span: brk.span });
                }
                Ok(RStmt::Break)
            }
            Stmt::Continue(cont) => {
                if !self.flags.contains(ResolveFlags::IN_LOOP) {
                    return Err(ResolveError::ContinueOutsideLoop { span: cont.span });
                }
                Ok(RStmt::Continue)
            }
            Stmt::Block(block) => {
                self.push_scope();
                let stmts = self.resolve_stmts(block.stmts);
                self.pop_scope();
                Ok(RStmt::Block(stmts?))
            }
            Stmt::If(if_stmt) => self.resolve_if(if_stmt),
            Stmt::While(while_stmt) => self.resolve_while(while_stmt),
            Stmt::For(for_stmt) => self.resolve_for(for_stmt),
            Stmt::Function(decl) => {
                if self.frame.is_some() {
                    return Err(ResolveError::type_mismatch(
                        decl.span,
                        "functions must be declared at the top level",
                    ));
                }
                self.resolve_function(decl)?;
                Ok(RStmt::Empty)
            }
        }
    }

    /// Resolve a nested statement (branch or loop body) in its own scope.
    fn resolve_scoped(&mut self, stmt: &Stmt<'_>) -> Result<RStmt> {
        self.push_scope();
        let resolved = self.resolve_stmt(stmt);
        self.pop_scope();
        resolved
    }

    fn resolve_loop_body(&mut self, body: &Stmt<'_>) -> Result<RStmt> {
        let outer = self.flags;
        self.flags.insert(ResolveFlags::IN_LOOP);
        let resolved = self.resolve_scoped(body);
        self.flags = outer;
        resolved
    }

    fn resolve_var_decl(&mut self, decl: &VarDeclStmt<'_>) -> Result<RStmt> {
        let mut stmts = Vec::with_capacity(decl.vars.len());

        for var in decl.vars {
            let ty = decl.ty.to_script_type_with_rank(var.dims.len() as u32);
            if contains_void(&ty) {
                return Err(ResolveError::type_mismatch(
                    var.span,
                    format!("variable '{}' cannot be void", var.name.name),
                ));
            }
            self.check_only_float(&ty, false, var.span)?;

            let sized = var.dims.iter().any(Option::is_some);
            let init = match (var.init, sized) {
                (Some(_), true) => {
                    return Err(ResolveError::type_mismatch(
                        var.span,
                        "a sized array declaration cannot have an initializer",
                    ));
                }
                (Some(init), false) => Init::Expr(self.resolve_as(init, &ty).map_err(|e| {
                    match e {
                        ResolveError::TypeMismatch { span, message } => ResolveError::TypeMismatch {
                            message: format!("in initializer of '{}': {message}", var.name.name),
                            span,
                        },
                        other => other,
                    }
                })?),
                (None, true) => {
                    let dims = var
                        .dims
                        .iter()
                        .map(|dim| dim.map(|d| self.resolve_as(d, &ScriptType::Int)).transpose())
                        .collect::<Result<Vec<_>>>()?;
                    Init::Sized(dims)
                }
                (None, false) => Init::Default,
            };

            // Declared after the initializer, so `int x = x;` refers to an
            // outer `x`.
            let target = self.declare(var.name.name, ty.clone(), var.name.span)?;
            stmts.push(RStmt::Decl { target, ty, init });
        }

        Ok(match stmts.len() {
            1 => stmts.pop().unwrap_or(RStmt::Empty),
            _ => RStmt::Block(stmts),
        })
    }

    fn resolve_return(&mut self, ret: &ReturnStmt<'_>) -> Result<RStmt> {
        let Some(return_type) = self.return_type().cloned() else {
            return Err(ResolveError::ReturnOutsideFunction { span: ret.span });
        };

        let value = match (ret.value, return_type.is_void()) {
            (None, true) => None,
            (Some(value), false) => Some(self.resolve_as(value, &return_type)?),
            (Some(_), true) => {
                return Err(ResolveError::type_mismatch(
                    ret.span,
                    "a void function cannot return a value",
                ));
            }
            (None, false) => {
                return Err(ResolveError::type_mismatch(
                    ret.span,
                    format!("expected a return value of type '{return_type}'"),
                ));
            }
        };
        Ok(RStmt::Return(value, ret.span))
    }

    fn resolve_if(&mut self, if_stmt: &IfStmt<'_>) -> Result<RStmt> {
        let condition = self.resolve_condition(if_stmt.condition)?;
        let then_branch = self.resolve_scoped(if_stmt.then_stmt)?;
        let else_branch = match if_stmt.else_stmt {
            Some(stmt) => Some(Box::new(self.resolve_scoped(stmt)?)),
            None => None,
        };
        Ok(RStmt::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn resolve_while(&mut self, while_stmt: &WhileStmt<'_>) -> Result<RStmt> {
        let condition = self.resolve_condition(while_stmt.condition)?;
        let body = self.resolve_loop_body(while_stmt.body)?;
        Ok(RStmt::While {
            condition,
            body: Box::new(body),
        })
    }

    fn resolve_for(&mut self, for_stmt: &ForStmt<'_>) -> Result<RStmt> {
        // The header variables live in a scope around the loop.
        self.push_scope();
        let resolved = self.resolve_for_inner(for_stmt);
        self.pop_scope();
        resolved
    }

    fn resolve_for_inner(&mut self, for_stmt: &ForStmt<'_>) -> Result<RStmt> {
        let init = match &for_stmt.init {
            Some(ForInit::VarDecl(decl)) => vec![self.resolve_var_decl(decl)?],
            Some(ForInit::Expr(expr)) => vec![RStmt::Expr(self.resolve_expr(expr)?)],
            None => Vec::new(),
        };
        let condition = for_stmt
            .condition
            .map(|c| self.resolve_condition(c))
            .transpose()?;
        let update = for_stmt.update.map(|u| self.resolve_expr(u)).transpose()?;
        let body = self.resolve_loop_body(for_stmt.body)?;

        Ok(RStmt::For {
            init,
            condition,
            update,
            body: Box::new(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::program::{Init, RStmt, VarRef};
    use crate::{ResolveOptions, Resolver, Unit};
    use bumpalo::Bump;
    use hostscript_core::{ResolveError, ScriptType};
    use hostscript_parser::Parser;
    use hostscript_registry::BindingRegistry;

    fn resolve(source: &str) -> Result<crate::ResolvedProgram, ResolveError> {
        let arena = Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let registry = BindingRegistry::new();
        Resolver::new(&registry, ResolveOptions::default())
            .resolve(&[], Unit::new("test", script))
            .map_err(|e| e.error)
    }

    #[test]
    fn conditions_must_be_bool() {
        assert!(resolve("if (true) { }").is_ok());
        let err = resolve("int x = 1; if (x) { }").unwrap_err();
        assert!(err.to_string().contains("condition must be 'bool', found 'int'"));
        assert!(resolve("while (1) { }").is_err());
        assert!(resolve("for (;1;) { }").is_err());
    }

    #[test]
    fn loop_control_placement() {
        assert!(resolve("while (true) { break; }").is_ok());
        assert!(resolve("for (;;) { if (true) continue; break; }").is_ok());
        assert!(matches!(resolve("break;").unwrap_err(), ResolveError::BreakOutsideLoop { .. }));
        assert!(matches!(
            resolve("if (true) continue;").unwrap_err(),
            ResolveError::ContinueOutsideLoop { .. }
        ));
        // Loop context does not leak into functions defined at top level.
        assert!(resolve("void f() { break; }").is_err());
    }

    #[test]
    fn return_placement_and_type() {
        assert!(matches!(
            resolve("return;").unwrap_err(),
            ResolveError::ReturnOutsideFunction { .. }
        ));
        assert!(resolve("void f() { return 1; }").is_err());
        assert!(resolve("int f() { return; }").is_err());
        assert!(resolve("float f() { return 1; }").is_ok());
        assert!(resolve("int f() { return 1.5; }").is_err());
    }

    #[test]
    fn block_scoping() {
        assert!(resolve("{ int x = 1; } int x = 2;").is_ok());
        assert!(resolve("{ int x = 1; } x;").unwrap_err().is_unresolved());
        assert!(matches!(
            resolve("int x = 1; int x = 2;").unwrap_err(),
            ResolveError::Redeclaration { .. }
        ));
        assert!(resolve("int x = 1; { int x = 2; }").is_ok());
    }

    #[test]
    fn for_header_scope() {
        let program = resolve("for (int i = 0; i < 3; i++) { } int i = 5;").unwrap();
        assert_eq!(program.globals, vec![ScriptType::Int, ScriptType::Int]);
        assert!(resolve("for (int i = 0; i < 3; i++) { } i;").is_err());
    }

    #[test]
    fn sized_arrays() {
        let program = resolve("int n = 2; float grid[3][n];").unwrap();
        let RStmt::Decl { ty, init: Init::Sized(dims), target } = &program.main[1] else {
            panic!("expected sized declaration");
        };
        assert_eq!(*ty, ScriptType::Float.array_of().array_of());
        assert_eq!(dims.len(), 2);
        assert!(matches!(target, VarRef::Global(1)));

        assert!(resolve("int a[2] = {1, 2};").is_err());
        assert!(resolve("int a[1.5];").is_err());
        assert!(resolve("int a[] = {1, 2};").is_ok());
    }

    #[test]
    fn void_variables_rejected() {
        assert!(resolve("void v;").is_err());
        assert!(resolve("void f(void x) { }").is_err());
    }

    #[test]
    fn multiple_declarators() {
        let program = resolve("int a = 1, b = a + 1;").unwrap();
        assert!(matches!(&program.main[0], RStmt::Block(decls) if decls.len() == 2));
    }

    #[test]
    fn function_locals_use_their_own_frame() {
        let program = resolve("int g = 0; int f(int a) { int b = a + g; return b; }").unwrap();
        assert_eq!(program.globals.len(), 1);
        assert_eq!(program.functions[0].slot_count, 2);
    }
}
