//! The core `Function` trait and its capability flags.

use tilecalc_common::ErrorValue;

use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::Value;

bitflags::bitflags! {
    /// Describes the capabilities and properties of a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FnCaps: u16 {
        /// The function always produces the same output for the same input and has no
        /// side effects. This is the default for most functions.
        const PURE          = 0b0000_0001;
        /// The function's output can change even with the same inputs (e.g., `RAND()`,
        /// `NOW()`). Cells calling one are re-evaluated on every recalculation.
        const VOLATILE      = 0b0000_0010;
        /// Only the first argument is evaluated up front; the rest are handed
        /// over unevaluated (e.g., `IF`, `CHOOSE`).
        const SHORT_CIRCUIT = 0b0000_0100;
    }
}

/// How one argument reaches the function body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArgMode {
    /// Evaluated before the call.
    Eager,
    /// Handed over unevaluated; [`ArgumentHandle::value`] evaluates on demand.
    Deferred,
}

pub trait Function: Send + Sync + 'static {
    /// Capability flags for this function
    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    fn name(&self) -> &'static str;

    fn min_args(&self) -> usize {
        0
    }

    /// `None` for variadic functions.
    fn max_args(&self) -> Option<usize> {
        None
    }

    fn volatile(&self) -> bool {
        self.caps().contains(FnCaps::VOLATILE)
    }

    /// Evaluation mode of the argument at `index`. Short-circuit functions
    /// take their first argument eagerly and the rest deferred.
    fn arg_mode(&self, index: usize) -> ArgMode {
        if self.caps().contains(FnCaps::SHORT_CIRCUIT) && index > 0 {
            ArgMode::Deferred
        } else {
            ArgMode::Eager
        }
    }

    fn eval<'a, 'b>(
        &self,
        args: &[ArgumentHandle<'a, 'b>],
        ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function_registry;

    #[test]
    fn caps_drive_argument_modes_and_volatility() {
        let iff = function_registry::get("IF").unwrap();
        assert_eq!(iff.arg_mode(0), ArgMode::Eager);
        assert_eq!(iff.arg_mode(2), ArgMode::Deferred);

        let sum = function_registry::get("SUM").unwrap();
        assert_eq!(sum.caps(), FnCaps::PURE);
        assert_eq!(sum.arg_mode(3), ArgMode::Eager);
        assert!(!sum.volatile());

        assert!(function_registry::get("RAND").unwrap().volatile());
    }
}
