//! The static type system shared by the parser, resolver and interpreter.

use std::fmt;

/// A script-visible type.
///
/// Scripts only ever see these types; host values are converted at the
/// binding boundary through [`FromValue`](crate::FromValue) and
/// [`IntoValue`](crate::IntoValue).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScriptType {
    /// No value. Only valid as a function return type.
    Void,
    /// 64-bit signed integer with wrapping arithmetic.
    Int,
    /// 64-bit IEEE-754 float.
    Float,
    Bool,
    String,
    /// Array of the element type, copied on assignment.
    Array(Box<ScriptType>),
}

impl ScriptType {
    /// Resolve a primitive type keyword, including the long-form aliases.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "void" => ScriptType::Void,
            "int" | "long" => ScriptType::Int,
            "float" | "double" => ScriptType::Float,
            "bool" | "boolean" => ScriptType::Bool,
            "string" => ScriptType::String,
            _ => return None,
        })
    }

    /// Parse a type name such as `int`, `float[]` or `string[][]`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let base_end = text.find('[').unwrap_or(text.len());
        let mut ty = Self::from_keyword(text[..base_end].trim())?;
        let mut rest = text[base_end..].trim();
        while !rest.is_empty() {
            rest = rest.strip_prefix('[')?.trim_start().strip_prefix(']')?.trim_start();
            if ty == ScriptType::Void {
                return None;
            }
            ty = ty.array_of();
        }
        Some(ty)
    }

    /// Wrap this type in one array dimension.
    pub fn array_of(self) -> Self {
        ScriptType::Array(Box::new(self))
    }

    /// The element type if this is an array.
    pub fn element(&self) -> Option<&ScriptType> {
        match self {
            ScriptType::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Number of array dimensions (0 for scalars).
    pub fn rank(&self) -> usize {
        match self {
            ScriptType::Array(inner) => 1 + inner.rank(),
            _ => 0,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScriptType::Int | ScriptType::Float)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ScriptType::Int | ScriptType::Float | ScriptType::Bool | ScriptType::String
        )
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ScriptType::Void)
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptType::Void => write!(f, "void"),
            ScriptType::Int => write!(f, "int"),
            ScriptType::Float => write!(f, "float"),
            ScriptType::Bool => write!(f, "bool"),
            ScriptType::String => write!(f, "string"),
            ScriptType::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}
