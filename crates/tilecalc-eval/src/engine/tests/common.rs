//! Common test helpers
use std::cell::Cell as Counter;
use std::rc::Rc;
use std::sync::Arc;

use tilecalc_common::{CellAddress, ErrorValue, SheetId};

use crate::engine::Workbook;
use crate::expr::Expr;
use crate::function::Function;
use crate::function_registry;
use crate::test_utils::a1;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::Value;

thread_local! {
    static CALLS: Counter<usize> = const { Counter::new(0) };
}

/// `COUNTCALLS(x)` returns `x` and counts its evaluations on the current
/// thread.
#[derive(Debug)]
struct CountCalls;

impl Function for CountCalls {
    fn name(&self) -> &'static str {
        "COUNTCALLS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn eval<'a, 'b>(
        &self,
        args: &[ArgumentHandle<'a, 'b>],
        _ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        CALLS.with(|c| c.set(c.get() + 1));
        Ok(args[0].value())
    }
}

/// Registers `COUNTCALLS` and resets this thread's counter.
pub fn count_calls(arg: Rc<Expr>) -> Rc<Expr> {
    function_registry::register(Arc::new(CountCalls));
    Expr::call("COUNTCALLS", vec![arg])
}

pub fn reset_calls() {
    CALLS.with(|c| c.set(0));
}

pub fn calls() -> usize {
    CALLS.with(|c| c.get())
}

pub fn n(v: f64) -> Value {
    Value::Number(v)
}

pub fn show(wb: &Workbook, sheet: SheetId, at: &str) -> String {
    let a = a1(at);
    wb.show(sheet, a.col, a.row)
}

pub fn addr(at: &str) -> CellAddress {
    a1(at)
}

/// Route engine events to the test harness; `RUST_LOG=tilecalc_eval=debug`
/// shows recalculation reports.
pub fn init_tracing() {
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
