//! Invariant checks for contract violations.
//!
//! `invariant!` panics when the condition fails in debug builds, or in any
//! build with the `checked` feature. Otherwise it compiles to nothing; every
//! guarded path is still memory-safe, only logically unspecified.

macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if cfg!(any(debug_assertions, feature = "checked")) {
            assert!($cond, $($arg)+);
        }
    };
}

pub(crate) use invariant;

#[cfg(test)]
mod tests {
    use super::invariant;

    #[test]
    fn holding_invariant_is_silent() {
        invariant!(1 + 1 == 2, "arithmetic");
    }

    #[cfg(any(debug_assertions, feature = "checked"))]
    #[test]
    fn broken_invariant_panics_when_checked() {
        let res = std::panic::catch_unwind(|| {
            invariant!(false, "expected failure {}", 7);
        });
        assert!(res.is_err());
    }

    #[cfg(not(any(debug_assertions, feature = "checked")))]
    #[test]
    fn broken_invariant_is_noop_unchecked() {
        invariant!(false, "compiled out");
    }
}
