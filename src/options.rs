//! Engine configuration.
//!
//! Options are typed values of [`EngineOption`]. [`EngineOptions`] holds the
//! current value of every option and starts from the defaults. Options can
//! also be given as a string-keyed map of [`Value`]s, using the keys listed
//! by [`EngineOption::KEYS`].

use std::collections::HashMap;

use hostscript_compiler::ResolveOptions;
use hostscript_core::{RegistrationError, Value};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;
pub const DEFAULT_MAIN_SCRIPT_NAME: &str = "main script";

/// A single engine option together with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOption {
    /// Maximum nesting of script function calls.
    MaxCallDepth(usize),
    /// Type integer literals as `float`.
    EvalIntLiteralAsFloat(bool),
    /// Reject every non-`float` declaration, literal and binding.
    EvalOnlyFloat(bool),
    /// The main script must be a single expression statement.
    EvalOnlyExpression(bool),
    /// Allow [`Engine::terminate_script`](crate::Engine::terminate_script).
    TerminatorEnabled(bool),
    /// Execute scripts. When off, `run` only parses and resolves.
    RunningEnabled(bool),
    /// Name of the main script in diagnostics.
    MainScriptName(String),
}

impl EngineOption {
    /// Keys accepted by [`EngineOption::from_entry`].
    pub const KEYS: [&'static str; 7] = [
        "MAX_CALL_DEPTH",
        "EVAL_INT_LITERAL_AS_FLOAT",
        "EVAL_ONLY_FLOAT",
        "EVAL_ONLY_EXPRESSION",
        "TERMINATOR_ENABLED",
        "RUNNING_ENABLED",
        "MAIN_SCRIPT_NAME",
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EngineOption::MaxCallDepth(_) => "MAX_CALL_DEPTH",
            EngineOption::EvalIntLiteralAsFloat(_) => "EVAL_INT_LITERAL_AS_FLOAT",
            EngineOption::EvalOnlyFloat(_) => "EVAL_ONLY_FLOAT",
            EngineOption::EvalOnlyExpression(_) => "EVAL_ONLY_EXPRESSION",
            EngineOption::TerminatorEnabled(_) => "TERMINATOR_ENABLED",
            EngineOption::RunningEnabled(_) => "RUNNING_ENABLED",
            EngineOption::MainScriptName(_) => "MAIN_SCRIPT_NAME",
        }
    }

    /// Parse one entry of a string-keyed option map.
    pub fn from_entry(key: &str, value: &Value) -> Result<Self, RegistrationError> {
        let invalid = |reason: String| RegistrationError::InvalidOption {
            key: key.to_string(),
            reason,
        };
        let expect_bool = || {
            value
                .as_bool()
                .ok_or_else(|| invalid(format!("expected bool, found {}", describe(value))))
        };

        Ok(match key {
            "MAX_CALL_DEPTH" => {
                let depth = value
                    .as_int()
                    .ok_or_else(|| invalid(format!("expected int, found {}", describe(value))))?;
                if depth <= 0 {
                    return Err(invalid(format!("call depth must be positive, found {depth}")));
                }
                let depth = usize::try_from(depth).map_err(|_| invalid(format!("{depth} is too large")))?;
                EngineOption::MaxCallDepth(depth)
            }
            "EVAL_INT_LITERAL_AS_FLOAT" => EngineOption::EvalIntLiteralAsFloat(expect_bool()?),
            "EVAL_ONLY_FLOAT" => EngineOption::EvalOnlyFloat(expect_bool()?),
            "EVAL_ONLY_EXPRESSION" => EngineOption::EvalOnlyExpression(expect_bool()?),
            "TERMINATOR_ENABLED" => EngineOption::TerminatorEnabled(expect_bool()?),
            "RUNNING_ENABLED" => EngineOption::RunningEnabled(expect_bool()?),
            "MAIN_SCRIPT_NAME" => {
                let name = value
                    .as_str()
                    .ok_or_else(|| invalid(format!("expected string, found {}", describe(value))))?;
                EngineOption::MainScriptName(name.to_string())
            }
            _ => return Err(invalid("unknown option".to_string())),
        })
    }
}

fn describe(value: &Value) -> String {
    value.script_type().to_string()
}

/// Current value of every engine option.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub max_call_depth: usize,
    pub eval_int_literal_as_float: bool,
    pub eval_only_float: bool,
    pub eval_only_expression: bool,
    pub terminator_enabled: bool,
    pub running_enabled: bool,
    pub main_script_name: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            eval_int_literal_as_float: false,
            eval_only_float: false,
            eval_only_expression: false,
            terminator_enabled: false,
            running_enabled: true,
            main_script_name: DEFAULT_MAIN_SCRIPT_NAME.to_string(),
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, option: EngineOption) {
        match option {
            EngineOption::MaxCallDepth(depth) => self.max_call_depth = depth,
            EngineOption::EvalIntLiteralAsFloat(on) => self.eval_int_literal_as_float = on,
            EngineOption::EvalOnlyFloat(on) => self.eval_only_float = on,
            EngineOption::EvalOnlyExpression(on) => self.eval_only_expression = on,
            EngineOption::TerminatorEnabled(on) => self.terminator_enabled = on,
            EngineOption::RunningEnabled(on) => self.running_enabled = on,
            EngineOption::MainScriptName(name) => self.main_script_name = name,
        }
    }

    /// Builder-style [`apply`](Self::apply).
    pub fn with(mut self, option: EngineOption) -> Self {
        self.apply(option);
        self
    }

    /// Parse a whole option map. Nothing is applied unless every entry is
    /// valid.
    pub fn parse_map(map: &HashMap<String, Value>) -> Result<Vec<EngineOption>, RegistrationError> {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| EngineOption::from_entry(key, &map[key]))
            .collect()
    }

    /// The subset of options the resolver needs.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            int_literal_as_float: self.eval_int_literal_as_float,
            only_float: self.eval_only_float,
            only_expression: self.eval_only_expression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.max_call_depth, 1024);
        assert!(options.running_enabled);
        assert!(!options.terminator_enabled);
        assert_eq!(options.main_script_name, "main script");
        assert_eq!(options.resolve_options(), ResolveOptions::default());
    }

    #[test]
    fn keys_round_trip_through_entries() {
        let samples = [
            EngineOption::MaxCallDepth(8),
            EngineOption::EvalIntLiteralAsFloat(true),
            EngineOption::EvalOnlyFloat(true),
            EngineOption::EvalOnlyExpression(true),
            EngineOption::TerminatorEnabled(true),
            EngineOption::RunningEnabled(false),
            EngineOption::MainScriptName("calc".to_string()),
        ];
        for (option, key) in samples.iter().zip(EngineOption::KEYS) {
            assert_eq!(option.key(), key);
        }
        assert_eq!(
            EngineOption::from_entry("MAX_CALL_DEPTH", &Value::Int(8)).unwrap(),
            EngineOption::MaxCallDepth(8)
        );
        assert_eq!(
            EngineOption::from_entry("MAIN_SCRIPT_NAME", &Value::String("calc".into())).unwrap(),
            EngineOption::MainScriptName("calc".to_string())
        );
    }

    #[test]
    fn invalid_entries() {
        let err = EngineOption::from_entry("NO_SUCH_OPTION", &Value::Bool(true)).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidOption { ref key, .. } if key == "NO_SUCH_OPTION"));

        let err = EngineOption::from_entry("RUNNING_ENABLED", &Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "invalid option 'RUNNING_ENABLED': expected bool, found int");

        assert!(EngineOption::from_entry("MAX_CALL_DEPTH", &Value::Int(0)).is_err());
        assert!(EngineOption::from_entry("MAX_CALL_DEPTH", &Value::Float(2.0)).is_err());
    }

    #[test]
    fn map_is_all_or_nothing() {
        let mut map = HashMap::new();
        map.insert("EVAL_ONLY_FLOAT".to_string(), Value::Bool(true));
        map.insert("MAX_CALL_DEPTH".to_string(), Value::Int(16));
        let parsed = EngineOptions::parse_map(&map).unwrap();
        let options = parsed.into_iter().fold(EngineOptions::new(), EngineOptions::with);
        assert!(options.eval_only_float);
        assert_eq!(options.max_call_depth, 16);

        map.insert("BOGUS".to_string(), Value::Bool(true));
        assert!(EngineOptions::parse_map(&map).is_err());
    }
}
