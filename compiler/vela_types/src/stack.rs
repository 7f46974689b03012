//! Stack safety for the deeply recursive walks.
//!
//! Subtype queries, substitution, and type-argument inference recurse on
//! the structure of types; pathological recursive generics can nest deeply
//! before the visited-set guards cut the recursion off. On native targets
//! the stack is grown on demand; WASM manages its own stack.

/// Remaining-stack threshold below which we grow (64KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 64 * 1024;

/// Stack space allocated per growth (2MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first when little remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_GROWTH, f)
}

/// WASM version: call through.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_recursion_survives() {
        fn descend(n: u32) -> u32 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { descend(n - 1) + 1 })
        }
        assert_eq!(descend(50_000), 50_000);
    }
}
