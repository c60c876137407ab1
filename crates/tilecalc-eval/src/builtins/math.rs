//! Numeric reductions and element-wise math.

use std::sync::Arc;

use tilecalc_common::ErrorValue;

use super::utils::{OnError, fold_numbers, sanitize};
use crate::function::Function;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Reduce {
    Sum,
    Average,
    Min,
    Max,
    Count,
}

#[derive(Debug)]
pub struct Reduction {
    name: &'static str,
    kind: Reduce,
}

impl Function for Reduction {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &[ArgumentHandle<'a, 'b>],
        ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        let on_error = if self.kind == Reduce::Count {
            OnError::Skip
        } else {
            OnError::Propagate
        };
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        fold_numbers(args, ctx.workbook, on_error, |n| {
            count += 1;
            sum += n;
            min = min.min(n);
            max = max.max(n);
        })?;
        Ok(match self.kind {
            Reduce::Sum => sanitize(sum),
            Reduce::Count => Value::Number(count as f64),
            Reduce::Average if count == 0 => Value::Error(ErrorValue::DIV),
            Reduce::Average => sanitize(sum / count as f64),
            Reduce::Min if count == 0 => Value::Number(0.0),
            Reduce::Min => Value::Number(min),
            Reduce::Max if count == 0 => Value::Number(0.0),
            Reduce::Max => Value::Number(max),
        })
    }
}

/// A one-argument numeric function applied element-wise to arrays.
#[derive(Debug)]
pub struct Unary {
    name: &'static str,
    f: fn(f64) -> Value,
}

impl Function for Unary {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        self.name
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
        ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        match args[0].value() {
            Value::Array(a) => Ok(Value::Array(a.map_numeric(ctx.workbook, self.f))),
            v => Ok((self.f)(v.to_number(ctx.workbook)?)),
        }
    }
}

fn sqrt(n: f64) -> Value {
    if n < 0.0 {
        Value::Error(ErrorValue::NUM)
    } else {
        Value::Number(n.sqrt())
    }
}

pub fn builtins() -> Vec<Arc<dyn Function>> {
    let reduce = |name, kind| Reduction { name, kind };
    builtin_list![
        reduce("SUM", Reduce::Sum),
        reduce("AVERAGE", Reduce::Average),
        reduce("MIN", Reduce::Min),
        reduce("MAX", Reduce::Max),
        reduce("COUNT", Reduce::Count),
        Unary {
            name: "ABS",
            f: |n| Value::Number(n.abs()),
        },
        Unary { name: "SQRT", f: sqrt },
    ]
}
