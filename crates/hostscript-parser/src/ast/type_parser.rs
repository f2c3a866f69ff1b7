//! Type expression parsing.

use super::parser::{MAX_NESTING_DEPTH, Parser};
use crate::ast::node::{PrimitiveType, TypeExpr};
use crate::lexer::TokenKind;
use hostscript_core::{ParseError, ParseErrorKind};

impl<'ast> Parser<'ast> {
    /// Parse a type: a type keyword followed by any number of `[]`.
    pub fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let token = *self.peek();
        let base = match token.kind {
            TokenKind::Void => PrimitiveType::Void,
            TokenKind::Int => PrimitiveType::Int,
            TokenKind::Float => PrimitiveType::Float,
            TokenKind::Bool => PrimitiveType::Bool,
            TokenKind::String => PrimitiveType::String,
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedType,
                    token.span,
                    format!("expected type, found {}", token.describe()),
                ));
            }
        };
        self.advance();

        let mut ty = TypeExpr::primitive(base, token.span);
        ty.array_rank = self.parse_empty_dims()?;
        ty.span = token.span.merge(self.previous_span());
        Ok(ty)
    }

    /// Consume `[]` pairs, returning how many were present.
    pub(super) fn parse_empty_dims(&mut self) -> Result<u32, ParseError> {
        let mut rank = 0;
        while self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
            if rank as usize >= MAX_NESTING_DEPTH {
                return Err(self.nesting_overflow());
            }
            self.advance();
            self.advance();
            rank += 1;
        }
        Ok(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use hostscript_core::ScriptType;

    #[test]
    fn parses_array_types() {
        let arena = Bump::new();
        let mut parser = Parser::new("double[][] x", &arena);
        let ty = parser.parse_type().unwrap();
        assert_eq!(ty.to_script_type(), ScriptType::Float.array_of().array_of());
        assert_eq!(parser.peek().lexeme, "x");
    }

    #[test]
    fn sized_brackets_are_not_part_of_the_type() {
        let arena = Bump::new();
        let mut parser = Parser::new("int[3]", &arena);
        let ty = parser.parse_type().unwrap();
        assert_eq!(ty.array_rank, 0);
        assert_eq!(parser.peek().kind, TokenKind::LeftBracket);
    }

    #[test]
    fn array_rank_is_bounded() {
        let arena = Bump::new();
        let source = format!("int{} x", "[]".repeat(MAX_NESTING_DEPTH + 1));
        let mut parser = Parser::new(&source, &arena);
        let err = parser.parse_type().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
    }

    #[test]
    fn rejects_non_type() {
        let arena = Bump::new();
        let mut parser = Parser::new("foo", &arena);
        let err = parser.parse_type().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedType);
        assert_eq!(err.message, "expected type, found identifier 'foo'");
    }
}
