//! Registration name parsing.
//!
//! Hosts name bindings with strings such as `"LOOP_MAX"`, `"output(int)"` or
//! `"float Math.scale(float, float[])"`. The parameter list, when present,
//! selects one overload; a leading type names the return type.

use std::fmt;

use crate::error::RegistrationError;
use crate::{QualifiedName, ScriptType};

/// A parsed registration name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: QualifiedName,
    /// `None` when the string carried no parameter list.
    pub params: Option<Vec<ScriptType>>,
    pub return_type: Option<ScriptType>,
}

impl Signature {
    pub fn parse(text: &str) -> Result<Self, RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidSignature {
            signature: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        let (head, params) = match trimmed.find('(') {
            Some(open) => {
                let close = trimmed
                    .rfind(')')
                    .filter(|&close| close > open)
                    .ok_or_else(|| invalid("missing ')'"))?;
                if !trimmed[close + 1..].trim().is_empty() {
                    return Err(invalid("unexpected text after ')'"));
                }
                let params = parse_params(&trimmed[open + 1..close]).ok_or_else(|| invalid("unknown parameter type"))?;
                (trimmed[..open].trim(), Some(params))
            }
            None => (trimmed, None),
        };

        let mut words = head.split_whitespace();
        let (return_type, name) = match (words.next(), words.next(), words.next()) {
            (Some(name), None, None) => (None, name),
            (Some(ret), Some(name), None) => {
                let ty = ScriptType::parse(ret).ok_or_else(|| invalid("unknown return type"))?;
                (Some(ty), name)
            }
            _ => return Err(invalid("expected '[type] name[(params)]'")),
        };

        let name = QualifiedName::from_qualified_string(name);
        if !name.is_valid_identifier() {
            return Err(RegistrationError::InvalidName {
                name: name.to_string(),
            });
        }

        Ok(Self {
            name,
            params,
            return_type,
        })
    }
}

fn parse_params(list: &str) -> Option<Vec<ScriptType>> {
    if list.trim().is_empty() {
        return Some(Vec::new());
    }
    list.split(',')
        .map(|param| {
            // A parameter may carry a name: "int count".
            let param = param.trim();
            let ty_text = match param.rsplit_once(char::is_whitespace) {
                Some((ty, name)) if !name.starts_with('[') && ScriptType::parse(param).is_none() => ty,
                _ => param,
            };
            ScriptType::parse(ty_text).filter(|ty| !ty.is_void())
        })
        .collect()
}

/// Render a parameter list as `int, float[]`.
pub fn format_params(params: &[ScriptType]) -> String {
    params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ret) = &self.return_type {
            write!(f, "{ret} ")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(params) = &self.params {
            write!(f, "({})", format_params(params))?;
        }
        Ok(())
    }
}
