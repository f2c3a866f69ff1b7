//! Call resolution.
//!
//! The candidates of an unqualified call are the script functions of that
//! name plus the host functions bound to it. A script function hides a host
//! function with the same parameter list. Qualified calls only see host
//! functions.

use hostscript_core::{QualifiedName, ResolveError, ScriptType};
use hostscript_parser::ast::CallExpr;
use hostscript_registry::Binding;

use super::expr::coerce;
use super::{Resolver, Result};
use crate::overload::{Candidate, resolve_overload};
use crate::program::{CallTarget, RExpr, RExprKind};

impl<'r> Resolver<'r> {
    pub(super) fn resolve_call(&mut self, call: &CallExpr<'_>) -> Result<RExpr> {
        let name = call.callee.qualified_string();

        // Arguments are resolved first so their types drive overload selection.
        let args = call
            .args
            .iter()
            .map(|arg| self.resolve_value(arg, None))
            .collect::<Result<Vec<_>>>()?;
        let arg_types: Vec<ScriptType> = args.iter().map(|a| a.ty.clone()).collect();

        let registry = self.registry;
        let host_functions = match registry.lookup(&QualifiedName::from_qualified_string(&name)) {
            Some(Binding::Functions(overloads)) => overloads,
            Some(Binding::Variable(_)) if !self.has_script_function(call) => {
                return Err(ResolveError::type_mismatch(
                    call.callee.span,
                    format!("'{name}' is a variable, not a function"),
                ));
            }
            _ => &[],
        };

        let script_indices: &[usize] = if call.callee.is_qualified() {
            &[]
        } else {
            self.function_names
                .get(call.callee.name())
                .map(Vec::as_slice)
                .unwrap_or(&[])
        };

        let mut candidates: Vec<Candidate<'_, CallTarget>> = script_indices
            .iter()
            .map(|&i| Candidate {
                params: &self.functions[i].params,
                target: CallTarget::Script(i),
            })
            .collect();
        let script_count = candidates.len();
        for func in host_functions {
            let hidden = candidates[..script_count]
                .iter()
                .any(|c| c.params == func.params());
            if !hidden {
                candidates.push(Candidate {
                    params: func.params(),
                    target: CallTarget::Host(func.clone()),
                });
            }
        }

        if candidates.is_empty() {
            return Err(ResolveError::UnresolvedSymbol {
                name,
                span: call.callee.span,
            });
        }

        let selected = resolve_overload(&name, &candidates, &arg_types, call.span)?;

        let return_type = match &selected.target {
            CallTarget::Script(i) => self.functions[*i].return_type.clone(),
            CallTarget::Host(func) => {
                for param in func.params() {
                    self.check_only_float(param, false, call.span)?;
                }
                self.check_only_float(func.return_type(), true, call.span)?;
                func.return_type().clone()
            }
        };

        let args = args
            .into_iter()
            .zip(&selected.params)
            .map(|(arg, param)| coerce(arg, param))
            .collect::<Result<Vec<_>>>()?;

        Ok(RExpr::new(
            RExprKind::Call {
                target: selected.target,
                name,
                args,
            },
            return_type,
            call.span,
        ))
    }

    fn has_script_function(&self, call: &CallExpr<'_>) -> bool {
        !call.callee.is_qualified() && self.function_names.contains_key(call.callee.name())
    }
}
