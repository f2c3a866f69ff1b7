//! Cost-based overload resolution.
//!
//! Every candidate whose arity matches and whose parameters accept the
//! argument types is viable. The viable candidate with the lowest total
//! conversion cost wins; a tie for the lowest cost is ambiguous.

use hostscript_core::{ResolveError, ScriptType, Span, format_params};

use crate::conversion::implicit_cost;

/// One overload considered for a call.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a, T> {
    pub params: &'a [ScriptType],
    /// Caller data identifying the overload (index or handle).
    pub target: T,
}

/// The selected overload.
#[derive(Debug, Clone)]
pub struct OverloadMatch<T> {
    pub target: T,
    pub params: Vec<ScriptType>,
    pub total_cost: u32,
}

/// Total cost of calling `params` with `args`, or `None` if not viable.
pub fn match_cost(params: &[ScriptType], args: &[ScriptType]) -> Option<u32> {
    if params.len() != args.len() {
        return None;
    }
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| implicit_cost(arg, param))
        .sum()
}

/// Select the best overload of `name` for the argument types.
///
/// Fails with `NoMatchingOverload` when no candidate is viable and with
/// `AmbiguousOverload` when several share the lowest cost.
pub fn resolve_overload<T: Clone>(
    name: &str,
    candidates: &[Candidate<'_, T>],
    args: &[ScriptType],
    span: Span,
) -> Result<OverloadMatch<T>, ResolveError> {
    let mut viable: Vec<(u32, &Candidate<'_, T>)> = candidates
        .iter()
        .filter_map(|c| match_cost(c.params, args).map(|cost| (cost, c)))
        .collect();

    if viable.is_empty() {
        return Err(ResolveError::NoMatchingOverload {
            name: name.to_string(),
            args: format_params(args),
            span,
        });
    }

    viable.sort_by_key(|(cost, _)| *cost);
    let best_cost = viable[0].0;
    let tied: Vec<_> = viable.iter().take_while(|(cost, _)| *cost == best_cost).collect();

    if tied.len() > 1 {
        return Err(ResolveError::AmbiguousOverload {
            name: name.to_string(),
            args: format_params(args),
            candidates: tied
                .iter()
                .map(|(_, c)| format!("{}({})", name, format_params(c.params)))
                .collect(),
            span,
        });
    }

    let (total_cost, best) = viable[0];
    Ok(OverloadMatch {
        target: best.target.clone(),
        params: best.params.to_vec(),
        total_cost,
    })
}
