use tilecalc_common::ErrorValue;

use crate::engine::Workbook;
use crate::expr::Expr;
use crate::traits::ArgumentHandle;
use crate::value::{ArrayValue, ExplicitArray, Value};

/// Turn NaN and infinities into `#NUM!`.
pub fn sanitize(n: f64) -> Value {
    if n.is_finite() {
        Value::Number(n)
    } else {
        Value::Error(ErrorValue::NUM)
    }
}

/// What a reduction does with error elements.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum OnError {
    Propagate,
    Skip,
}

/// Feed every number found in `args` to `f`.
///
/// Numbers inside arrays and areas count; text and blanks there are
/// skipped. A text argument written literally in the formula is parsed,
/// while text reached through a reference is skipped.
pub fn fold_numbers(
    args: &[ArgumentHandle<'_, '_>],
    wb: &Workbook,
    on_error: OnError,
    mut f: impl FnMut(f64),
) -> Result<(), ErrorValue> {
    for arg in args {
        match arg.value() {
            Value::Number(n) => f(n),
            Value::Empty => {}
            Value::Text(s) => {
                if matches!(arg.expr(), Expr::Text(_)) {
                    f(s.trim().parse::<f64>().map_err(|_| ErrorValue::VALUE)?);
                }
            }
            Value::Error(e) => {
                if on_error == OnError::Propagate {
                    return Err(e);
                }
            }
            Value::Array(a) => {
                for v in a.iter(wb) {
                    match v {
                        Value::Number(n) => f(n),
                        Value::Error(e) if on_error == OnError::Propagate => return Err(e),
                        _ => {}
                    }
                }
            }
        }
    }
    Ok(())
}

/// Apply a binary scalar operation, broadcasting over arrays.
///
/// A scalar pairs with every element of an array. Two arrays combine
/// element-wise over the larger shape; missing elements read as `#N/A`.
pub fn broadcast(wb: &Workbook, lhs: Value, rhs: Value, op: impl Fn(&Value, &Value) -> Value) -> Value {
    match (lhs, rhs) {
        (Value::Array(a), Value::Array(b)) => {
            let cols = a.cols().max(b.cols());
            let rows = a.rows().max(b.rows());
            let mut out = Vec::with_capacity((cols * rows) as usize);
            for r in 0..rows {
                for c in 0..cols {
                    out.push(op(&a.get(wb, c, r), &b.get(wb, c, r)));
                }
            }
            Value::Array(ArrayValue::Explicit(ExplicitArray::new(cols, rows, out)))
        }
        (Value::Array(a), s) => Value::Array(a.map_values(wb, |v| op(&v, &s))),
        (s, Value::Array(b)) => Value::Array(b.map_values(wb, |v| op(&s, &v))),
        (x, y) => op(&x, &y),
    }
}
