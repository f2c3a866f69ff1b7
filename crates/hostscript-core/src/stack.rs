//! Native stack management for the recursive passes.
//!
//! The parser, the resolver and the interpreter all recurse over script
//! structure. Each recursive step goes through [`ensure_sufficient_stack`],
//! which moves onto a freshly allocated stack segment when the current one
//! runs low, so deep scripts fail with a script error instead of taking the
//! host thread down.

/// Remaining stack below which a new segment is allocated.
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Run `f`, first growing the stack if fewer than [`STACK_RED_ZONE`] bytes
/// remain.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, f)
}
