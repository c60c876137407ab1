//! Infix and prefix operators, registered as functions named by their symbol.

use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;

use tilecalc_common::ErrorValue;

use super::utils::{broadcast, sanitize};
use crate::engine::Workbook;
use crate::function::Function;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug)]
pub struct BinaryOp {
    symbol: &'static str,
    op: Op,
}

impl BinaryOp {
    fn apply(&self, wb: &Workbook, x: &Value, y: &Value) -> Value {
        match self.op {
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow => {
                let (a, b) = match (x.to_number(wb), y.to_number(wb)) {
                    (Ok(a), Ok(b)) => (a, b),
                    (Err(e), _) | (_, Err(e)) => return Value::Error(e),
                };
                match self.op {
                    Op::Add => sanitize(a + b),
                    Op::Sub => sanitize(a - b),
                    Op::Mul => sanitize(a * b),
                    Op::Div if b == 0.0 => Value::Error(ErrorValue::DIV),
                    Op::Div => sanitize(a / b),
                    _ => sanitize(a.powf(b)),
                }
            }
            Op::Concat => match (x.to_text(wb), y.to_text(wb)) {
                (Ok(a), Ok(b)) => Value::Text(Rc::from(format!("{a}{b}"))),
                (Err(e), _) | (_, Err(e)) => Value::Error(e),
            },
            _ => match compare(x, y) {
                Ok(ord) => Value::from_bool(match self.op {
                    Op::Eq => ord == Ordering::Equal,
                    Op::Ne => ord != Ordering::Equal,
                    Op::Lt => ord == Ordering::Less,
                    Op::Le => ord != Ordering::Greater,
                    Op::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                }),
                Err(e) => Value::Error(e),
            },
        }
    }
}

/// Spreadsheet ordering: numbers sort before text, text compares
/// case-insensitively, blanks read as `0` or `""` to match the other side.
fn compare(x: &Value, y: &Value) -> Result<Ordering, ErrorValue> {
    match (x, y) {
        (Value::Error(e), _) | (_, Value::Error(e)) => Err(*e),
        (Value::Array(_), _) | (_, Value::Array(_)) => Err(ErrorValue::VALUE),
        (Value::Empty, Value::Empty) => Ok(Ordering::Equal),
        (Value::Empty, Value::Number(b)) => cmp_numbers(0.0, *b),
        (Value::Number(a), Value::Empty) => cmp_numbers(*a, 0.0),
        (Value::Empty, Value::Text(b)) => Ok(cmp_text("", b)),
        (Value::Text(a), Value::Empty) => Ok(cmp_text(a, "")),
        (Value::Number(a), Value::Number(b)) => cmp_numbers(*a, *b),
        (Value::Text(a), Value::Text(b)) => Ok(cmp_text(a, b)),
        (Value::Number(_), Value::Text(_)) => Ok(Ordering::Less),
        (Value::Text(_), Value::Number(_)) => Ok(Ordering::Greater),
    }
}

fn cmp_numbers(a: f64, b: f64) -> Result<Ordering, ErrorValue> {
    a.partial_cmp(&b).ok_or(ErrorValue::NUM)
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl Function for BinaryOp {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        self.symbol
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
        Ok(broadcast(wb, args[0].value(), args[1].value(), |x, y| {
            self.apply(wb, x, y)
        }))
    }
}

/// Unary minus.
#[derive(Debug)]
pub struct NegFn;

impl Function for NegFn {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        "NEG"
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
            Value::Array(a) => Ok(Value::Array(
                a.map_numeric(ctx.workbook, |n| Value::Number(-n)),
            )),
            v => Ok(Value::Number(-v.to_number(ctx.workbook)?)),
        }
    }
}

pub fn builtins() -> Vec<Arc<dyn Function>> {
    let op = |symbol, op| BinaryOp { symbol, op };
    builtin_list![
        op("+", Op::Add),
        op("-", Op::Sub),
        op("*", Op::Mul),
        op("/", Op::Div),
        op("^", Op::Pow),
        op("&", Op::Concat),
        op("=", Op::Eq),
        op("<>", Op::Ne),
        op("<", Op::Lt),
        op("<=", Op::Le),
        op(">", Op::Gt),
        op(">=", Op::Ge),
        NegFn,
    ]
}
