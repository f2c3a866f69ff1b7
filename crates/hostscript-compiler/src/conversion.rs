//! Type conversion rules.
//!
//! The only implicit conversion is the `int` to `float` promotion. Explicit
//! casts convert between scalar types.

use hostscript_core::ScriptType;

/// Cost of an exact type match in overload ranking.
pub const COST_EXACT: u32 = 0;
/// Cost of the `int` to `float` promotion.
pub const COST_PROMOTION: u32 = 1;

/// The cost of implicitly converting `from` to `to`, or `None` when no
/// implicit conversion exists.
pub fn implicit_cost(from: &ScriptType, to: &ScriptType) -> Option<u32> {
    if from == to {
        Some(COST_EXACT)
    } else if *from == ScriptType::Int && *to == ScriptType::Float {
        Some(COST_PROMOTION)
    } else {
        None
    }
}

/// The common type of two numeric operands after promotion.
pub fn numeric_common_type(a: &ScriptType, b: &ScriptType) -> Option<ScriptType> {
    match (a, b) {
        (ScriptType::Int, ScriptType::Int) => Some(ScriptType::Int),
        (ScriptType::Float | ScriptType::Int, ScriptType::Float | ScriptType::Int) => Some(ScriptType::Float),
        _ => None,
    }
}

/// Whether an explicit `(to)expr` cast from `from` is allowed.
pub fn can_cast(from: &ScriptType, to: &ScriptType) -> bool {
    use ScriptType::*;
    match to {
        Int | Float | Bool => matches!(from, Int | Float | Bool),
        String => from.is_scalar(),
        _ => from == to,
    }
}
