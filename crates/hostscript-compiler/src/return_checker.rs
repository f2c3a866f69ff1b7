//! Return path verification for non-void functions.
//!
//! [`ReturnChecker`] walks a function body and decides whether every path
//! through it ends in a `return`. The analysis is structural:
//!
//! - `return` always returns
//! - a block returns if any of its statements always returns
//! - `if` returns only with an `else` and when both branches return
//! - `while (true)` and `for (;;)` without a `break` of their own never
//!   fall through, so they count as returning

use hostscript_parser::ast::{Block, Expr, LiteralKind, Stmt};

/// Verifies all code paths return a value.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnChecker;

impl ReturnChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check if every path through `block` returns.
    pub fn block_returns(&self, block: &Block<'_>) -> bool {
        block.stmts.iter().any(|stmt| self.stmt_returns(stmt))
    }

    pub fn stmt_returns(&self, stmt: &Stmt<'_>) -> bool {
        match stmt {
            Stmt::Return(_) => true,
            Stmt::Block(block) => self.block_returns(block),
            Stmt::If(if_stmt) => match if_stmt.else_stmt {
                Some(else_stmt) => self.stmt_returns(if_stmt.then_stmt) && self.stmt_returns(else_stmt),
                None => false,
            },
            Stmt::While(while_stmt) => {
                is_constant_true(while_stmt.condition) && !self.contains_break(while_stmt.body)
            }
            Stmt::For(for_stmt) => {
                let infinite = for_stmt.condition.is_none_or(is_constant_true);
                infinite && !self.contains_break(for_stmt.body)
            }
            _ => false,
        }
    }

    /// Whether `stmt` contains a `break` that leaves the loop it belongs to.
    /// Breaks inside nested loops are ignored.
    fn contains_break(&self, stmt: &Stmt<'_>) -> bool {
        match stmt {
            Stmt::Break(_) => true,
            Stmt::Block(block) => block.stmts.iter().any(|s| self.contains_break(s)),
            Stmt::If(if_stmt) => {
                self.contains_break(if_stmt.then_stmt)
                    || if_stmt.else_stmt.is_some_and(|s| self.contains_break(s))
            }
            _ => false,
        }
    }
}

fn is_constant_true(expr: &Expr<'_>) -> bool {
    match expr {
        Expr::Literal(lit) => matches!(lit.kind, LiteralKind::Bool(true)),
        Expr::Paren(paren) => is_constant_true(paren.expr),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use hostscript_parser::Parser;

    fn first_function_returns(source: &str) -> bool {
        let arena = Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let func = script.functions().next().unwrap();
        ReturnChecker::new().block_returns(&func.body)
    }

    #[test]
    fn plain_return() {
        assert!(first_function_returns("int f() { return 1; }"));
        assert!(!first_function_returns("int f() { int x = 1; }"));
    }

    #[test]
    fn if_needs_both_branches() {
        assert!(first_function_returns(
            "int f(int x) { if (x > 0) return 1; else return 2; }"
        ));
        assert!(!first_function_returns("int f(int x) { if (x > 0) return 1; }"));
        assert!(first_function_returns(
            "int f(int x) { if (x > 0) return 1; return 0; }"
        ));
    }

    #[test]
    fn infinite_loops() {
        assert!(first_function_returns("int f() { while (true) { } }"));
        assert!(first_function_returns("int f() { for (;;) { return 1; } }"));
        assert!(!first_function_returns("int f() { while (true) { break; } }"));
        assert!(first_function_returns(
            "int f() { while (true) { while (true) { break; } } }"
        ));
        assert!(!first_function_returns("int f(int x) { while (x > 0) { return 1; } }"));
    }
}
