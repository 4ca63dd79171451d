//! Stack growth for recursive tree walks
//!
//! Parsing, evaluation, display and teardown of the syntax tree all recurse
//! once per nesting level. Each of them runs its recursive step through
//! [`guarded`] so deeply nested input spills onto heap-allocated stack
//! segments instead of overflowing the thread stack.

/// Remaining stack below which a new segment is allocated
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB
/// Size of each new segment
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // 4MB

/// Run `f`, growing the stack first if it is nearly exhausted
#[inline]
pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, f)
}
