use std::fmt;

/// Separator between namespace segments and the member name.
pub const NAMESPACE_SEPARATOR: char = '.';

/// A script-visible name with an optional namespace path.
///
/// This is the key of the binding registry. Bare names live in the global
/// namespace; names registered under a host namespace alias carry the alias
/// as their namespace path.
///
/// # Examples
///
/// ```
/// use hostscript_core::QualifiedName;
///
/// let bare = QualifiedName::global("output");
/// assert_eq!(bare.to_string(), "output");
///
/// let member = QualifiedName::new("LOOP_MAX", vec!["Example".into()]);
/// assert_eq!(member.to_string(), "Example.LOOP_MAX");
/// assert_eq!(QualifiedName::from_qualified_string("Example.LOOP_MAX"), member);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Namespace path, empty for the global namespace.
    pub namespace: Vec<String>,
    /// Simple name (e.g. "output").
    pub name: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Create a qualified name in the global namespace.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Create from a dotted string (e.g. "Example.output").
    ///
    /// The last segment is the name, the rest is the namespace. Empty
    /// segments are dropped, so ".output" is the same as "output".
    pub fn from_qualified_string(s: &str) -> Self {
        let mut parts: Vec<String> = s
            .split(NAMESPACE_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        match parts.pop() {
            Some(name) => Self {
                name,
                namespace: parts,
            },
            None => Self::global(""),
        }
    }

    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    pub fn simple_name(&self) -> &str {
        &self.name
    }

    pub fn namespace_path(&self) -> &[String] {
        &self.namespace
    }

    /// The namespace joined with the separator, empty for global names.
    pub fn namespace_string(&self) -> String {
        self.namespace.join(".")
    }

    /// The same simple name in the global namespace.
    pub fn to_bare(&self) -> Self {
        Self::global(self.name.clone())
    }

    /// Place this name under the given namespace alias path.
    pub fn within(&self, alias: &QualifiedName) -> Self {
        let mut namespace = alias.namespace.clone();
        if !alias.name.is_empty() {
            namespace.push(alias.name.clone());
        }
        namespace.extend(self.namespace.iter().cloned());
        Self {
            name: self.name.clone(),
            namespace,
        }
    }

    /// Whether every segment is a valid script identifier.
    pub fn is_valid_identifier(&self) -> bool {
        fn ident(s: &str) -> bool {
            let mut chars = s.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        ident(&self.name) && self.namespace.iter().all(|s| ident(s))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace.join("."), self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_qualified_string(s)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from_qualified_string(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_global() {
        let name = QualifiedName::from_qualified_string("output");
        assert!(name.is_global());
        assert_eq!(name.simple_name(), "output");
    }

    #[test]
    fn parse_nested() {
        let name = QualifiedName::from_qualified_string("Game.Core.tick");
        assert_eq!(name.namespace_path(), &["Game".to_string(), "Core".to_string()]);
        assert_eq!(name.namespace_string(), "Game.Core");
        assert_eq!(name.to_string(), "Game.Core.tick");
    }

    #[test]
    fn leading_separator_is_ignored() {
        assert_eq!(
            QualifiedName::from_qualified_string(".output"),
            QualifiedName::global("output")
        );
    }

    #[test]
    fn within_and_bare() {
        let alias = QualifiedName::from_qualified_string("Example");
        let member = QualifiedName::global("LOOP_MAX").within(&alias);
        assert_eq!(member.to_string(), "Example.LOOP_MAX");
        assert_eq!(member.to_bare(), QualifiedName::global("LOOP_MAX"));
    }

    #[test]
    fn identifier_validation() {
        assert!(QualifiedName::from("Example.LOOP_MAX").is_valid_identifier());
        assert!(QualifiedName::from("_x1").is_valid_identifier());
        assert!(!QualifiedName::from("1x").is_valid_identifier());
        assert!(!QualifiedName::from("output(int)").is_valid_identifier());
        assert!(!QualifiedName::global("").is_valid_identifier());
    }
}
