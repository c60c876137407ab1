//! Functions that produce arrays, intended for array formulas.

use std::sync::Arc;

use tilecalc_common::ErrorValue;

use crate::engine::Workbook;
use crate::function::Function;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::{ArrayValue, Value};

fn numbers_of(v: Value, wb: &Workbook) -> Result<Vec<f64>, ErrorValue> {
    match v {
        Value::Array(a) => {
            let mut out = Vec::new();
            for item in a.iter(wb) {
                match item {
                    Value::Number(n) => out.push(n),
                    Value::Error(e) => return Err(e),
                    _ => {}
                }
            }
            Ok(out)
        }
        Value::Empty => Ok(Vec::new()),
        other => Ok(vec![other.to_number(wb)?]),
    }
}

/* ─────────────────────────── FREQUENCY() ────────────────────────── */

/// `FREQUENCY(data, bins)`: a column with one count per bin, plus a final
/// count of values above the largest bin. A value lands in the first bin
/// (in ascending order) that is not smaller than it.
#[derive(Debug)]
pub struct FrequencyFn;

impl Function for FrequencyFn {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        "FREQUENCY"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn eval<'a, 'b>(
        &self,
        args: &[ArgumentHandle<'a, 'b>],
        ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        let wb = ctx.workbook;
        let data = numbers_of(args[0].value(), wb)?;
        let bins = numbers_of(args[1].value(), wb)?;
        let mut order: Vec<usize> = (0..bins.len()).collect();
        order.sort_by(|&a, &b| bins[a].total_cmp(&bins[b]));
        let mut counts = vec![0.0; bins.len() + 1];
        for x in data {
            let slot = order
                .iter()
                .find(|&&i| x <= bins[i])
                .copied()
                .unwrap_or(bins.len());
            counts[slot] += 1.0;
        }
        Ok(Value::Array(ArrayValue::column(
            counts.into_iter().map(Value::Number).collect(),
        )))
    }
}

/* ─────────────────────────── TRANSPOSE() ────────────────────────── */

#[derive(Debug)]
pub struct TransposeFn;

impl Function for TransposeFn {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        "TRANSPOSE"
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
        let wb = ctx.workbook;
        match args[0].value() {
            Value::Array(a) => {
                let (cols, rows) = (a.cols(), a.rows());
                let mut out = Vec::with_capacity((cols * rows) as usize);
                for c in 0..cols {
                    for r in 0..rows {
                        out.push(a.get(wb, c, r));
                    }
                }
                Ok(Value::Array(ArrayValue::new(rows, cols, out)))
            }
            scalar => Ok(scalar),
        }
    }
}

pub fn builtins() -> Vec<Arc<dyn Function>> {
    builtin_list![FrequencyFn, TransposeFn]
}
