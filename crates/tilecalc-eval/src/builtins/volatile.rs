//! Volatile functions: re-evaluated on every recalculation.

use std::sync::Arc;

use tilecalc_common::ErrorValue;

use crate::function::Function;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::Value;

/// `RAND()`: uniform in `[0, 1)`, drawn from the workbook's seeded generator.
#[derive(Debug)]
pub struct RandFn;

impl Function for RandFn {
    func_caps!(VOLATILE);

    fn name(&self) -> &'static str {
        "RAND"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }

    fn eval<'a, 'b>(
        &self,
        _args: &[ArgumentHandle<'a, 'b>],
        ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        Ok(Value::Number(ctx.workbook.next_random()))
    }
}

/// `NOW()`: local date and time as a serial day number (days since
/// 1899-12-30, fraction is the time of day).
#[derive(Debug)]
pub struct NowFn;

impl Function for NowFn {
    func_caps!(VOLATILE);

    fn name(&self) -> &'static str {
        "NOW"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }

    fn eval<'a, 'b>(
        &self,
        _args: &[ArgumentHandle<'a, 'b>],
        _ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        now_serial().map(Value::Number).ok_or(ErrorValue::NA)
    }
}

#[cfg(feature = "system-clock")]
fn now_serial() -> Option<f64> {
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let now = chrono::Local::now().naive_local();
    Some((now - epoch).num_milliseconds() as f64 / 86_400_000.0)
}

#[cfg(not(feature = "system-clock"))]
fn now_serial() -> Option<f64> {
    None
}

pub fn builtins() -> Vec<Arc<dyn Function>> {
    builtin_list![RandFn, NowFn]
}
