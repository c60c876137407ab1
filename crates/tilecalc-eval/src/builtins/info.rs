//! Error inspection.

use std::sync::Arc;

use tilecalc_common::ErrorValue;

use crate::function::Function;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::Value;

#[derive(Debug)]
pub struct IsErrorFn;

impl Function for IsErrorFn {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        "ISERROR"
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
        Ok(Value::from_bool(args[0].value().is_error()))
    }
}

#[derive(Debug)]
pub struct IsBlankFn;

impl Function for IsBlankFn {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        "ISBLANK"
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
        Ok(Value::from_bool(matches!(args[0].value(), Value::Empty)))
    }
}

/// `NA()`: the `#N/A` error.
#[derive(Debug)]
pub struct NaFn;

impl Function for NaFn {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        "NA"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }

    fn eval<'a, 'b>(
        &self,
        _args: &[ArgumentHandle<'a, 'b>],
        _ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        Err(ErrorValue::NA)
    }
}

pub fn builtins() -> Vec<Arc<dyn Function>> {
    builtin_list![IsErrorFn, IsBlankFn, NaFn]
}
