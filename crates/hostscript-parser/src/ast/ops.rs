//! Operator definitions.
//!
//! Binary, unary, postfix and assignment operators together with their
//! binding powers for the Pratt parser.

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators, ordered from lowest to highest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl BinaryOp {
    /// Returns (left_bp, right_bp). All binary operators are left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            LogicalOr => (3, 4),
            LogicalAnd => (5, 6),
            Equal | NotEqual => (7, 8),
            Less | LessEqual | Greater | GreaterEqual => (9, 10),
            Add | Sub => (11, 12),
            Mul | Div | Mod => (13, 14),
        }
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            PipePipe => BinaryOp::LogicalOr,
            AmpAmp => BinaryOp::LogicalAnd,
            EqualEqual => BinaryOp::Equal,
            BangEqual => BinaryOp::NotEqual,
            Less => BinaryOp::Less,
            LessEqual => BinaryOp::LessEqual,
            Greater => BinaryOp::Greater,
            GreaterEqual => BinaryOp::GreaterEqual,
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Mod,
            _ => return None,
        })
    }

    pub fn is_comparison(&self) -> bool {
        use BinaryOp::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicalOr | BinaryOp::LogicalAnd)
    }

    pub fn is_arithmetic(&self) -> bool {
        use BinaryOp::*;
        matches!(self, Add | Sub | Mul | Div | Mod)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            LogicalOr => "||",
            LogicalAnd => "&&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        };
        write!(f, "{}", s)
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `!`
    LogicalNot,
    /// `++`
    PreInc,
    /// `--`
    PreDec,
}

impl UnaryOp {
    /// Higher than all binary operators.
    pub fn binding_power() -> u8 {
        15
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            Minus => UnaryOp::Neg,
            Plus => UnaryOp::Plus,
            Bang => UnaryOp::LogicalNot,
            PlusPlus => UnaryOp::PreInc,
            MinusMinus => UnaryOp::PreDec,
            _ => return None,
        })
    }

    /// Increment and decrement write back to their operand.
    pub fn is_mutating(&self) -> bool {
        matches!(self, UnaryOp::PreInc | UnaryOp::PreDec)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UnaryOp::*;
        let s = match self {
            Neg => "-",
            Plus => "+",
            LogicalNot => "!",
            PreInc => "++",
            PreDec => "--",
        };
        write!(f, "{}", s)
    }
}

/// Postfix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOp {
    /// `++`
    PostInc,
    /// `--`
    PostDec,
}

impl PostfixOp {
    /// Highest precedence, shared with calls and indexing.
    pub fn binding_power() -> u8 {
        17
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        Some(match token {
            TokenKind::PlusPlus => PostfixOp::PostInc,
            TokenKind::MinusMinus => PostfixOp::PostDec,
            _ => return None,
        })
    }
}

impl fmt::Display for PostfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PostfixOp::PostInc => "++",
            PostfixOp::PostDec => "--",
        };
        write!(f, "{}", s)
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
}

impl AssignOp {
    /// Lowest precedence, right-associative.
    pub fn binding_power() -> (u8, u8) {
        (2, 1)
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            Equal => AssignOp::Assign,
            PlusEqual => AssignOp::AddAssign,
            MinusEqual => AssignOp::SubAssign,
            StarEqual => AssignOp::MulAssign,
            SlashEqual => AssignOp::DivAssign,
            PercentEqual => AssignOp::ModAssign,
            _ => return None,
        })
    }

    /// The arithmetic operator of a compound assignment.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        use AssignOp::*;
        match self {
            Assign => None,
            AddAssign => Some(BinaryOp::Add),
            SubAssign => Some(BinaryOp::Sub),
            MulAssign => Some(BinaryOp::Mul),
            DivAssign => Some(BinaryOp::Div),
            ModAssign => Some(BinaryOp::Mod),
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AssignOp::*;
        let s = match self {
            Assign => "=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
        };
        write!(f, "{}", s)
    }
}
