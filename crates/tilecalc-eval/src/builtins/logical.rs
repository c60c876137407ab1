//! Conditionals and boolean connectives.
//!
//! There is no boolean type: true is `1`, false is `0`, and any non-zero
//! number counts as true.

use std::sync::Arc;

use tilecalc_common::ErrorValue;

use crate::function::Function;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::Value;

/* ─────────────────────────── IF() ───────────────────────────────── */

/// `IF(cond, then, [else])`. Only the chosen branch is evaluated; a
/// missing else-branch yields `0`.
#[derive(Debug)]
pub struct IfFn;

impl Function for IfFn {
    func_caps!(PURE | SHORT_CIRCUIT);

    fn name(&self) -> &'static str {
        "IF"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn eval<'a, 'b>(
        &self,
        args: &[ArgumentHandle<'a, 'b>],
        _ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        if args[0].truthy()? {
            Ok(args[1].value())
        } else {
            Ok(args.get(2).map_or(Value::Number(0.0), |h| h.value()))
        }
    }
}

/* ─────────────────────────── CHOOSE() ───────────────────────────── */

#[derive(Debug)]
pub struct ChooseFn;

impl Function for ChooseFn {
    func_caps!(PURE | SHORT_CIRCUIT);

    fn name(&self) -> &'static str {
        "CHOOSE"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn eval<'a, 'b>(
        &self,
        args: &[ArgumentHandle<'a, 'b>],
        _ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        let index = args[0].number()?.trunc();
        if index >= 1.0 && (index as usize) < args.len() {
            Ok(args[index as usize].value())
        } else {
            Err(ErrorValue::VALUE)
        }
    }
}

/* ─────────────────────────── IFERROR() ──────────────────────────── */

#[derive(Debug)]
pub struct IfErrorFn;

impl Function for IfErrorFn {
    func_caps!(PURE | SHORT_CIRCUIT);

    fn name(&self) -> &'static str {
        "IFERROR"
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
        _ctx: &EvalContext<'b>,
    ) -> Result<Value, ErrorValue> {
        match args[0].value() {
            Value::Error(_) => Ok(args[1].value()),
            v => Ok(v),
        }
    }
}

/* ─────────────────────────── AND() / OR() ───────────────────────── */

#[derive(Debug)]
pub struct Connective {
    name: &'static str,
    all: bool,
}

impl Function for Connective {
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
        let wb = ctx.workbook;
        let mut truths = Vec::new();
        for arg in args {
            match arg.value() {
                Value::Array(a) => {
                    for v in a.iter(wb) {
                        match v {
                            Value::Number(n) => truths.push(n != 0.0),
                            Value::Error(e) => return Err(e),
                            _ => {}
                        }
                    }
                }
                Value::Empty => {}
                v => truths.push(v.to_bool(wb)?),
            }
        }
        if truths.is_empty() {
            return Err(ErrorValue::VALUE);
        }
        let result = if self.all {
            truths.iter().all(|t| *t)
        } else {
            truths.iter().any(|t| *t)
        };
        Ok(Value::from_bool(result))
    }
}

/* ─────────────────────────── NOT() ──────────────────────────────── */

#[derive(Debug)]
pub struct NotFn;

impl Function for NotFn {
    func_caps!(PURE);

    fn name(&self) -> &'static str {
        "NOT"
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
        Ok(Value::from_bool(!args[0].truthy()?))
    }
}

pub fn builtins() -> Vec<Arc<dyn Function>> {
    builtin_list![
        IfFn,
        ChooseFn,
        IfErrorFn,
        Connective { name: "AND", all: true },
        Connective { name: "OR", all: false },
        NotFn,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Workbook;
    use crate::expr::Expr;
    use crate::test_utils::num;

    fn eval(e: &Expr) -> Value {
        let wb = Workbook::new();
        let ctx = EvalContext::new(&wb, 0, 0, 0);
        e.eval(&ctx)
    }

    #[test]
    fn if_skips_the_branch_not_taken() {
        let div0 = Expr::binary("/", num(1.0), num(0.0));
        let e = Expr::call("IF", vec![num(1.0), num(7.0), div0.clone()]);
        assert_eq!(eval(&e), Value::Number(7.0));
        let e = Expr::call("IF", vec![num(0.0), num(7.0), div0]);
        assert_eq!(eval(&e), Value::Error(ErrorValue::DIV));
        let e = Expr::call("IF", vec![num(0.0), num(7.0)]);
        assert_eq!(eval(&e), Value::Number(0.0));
    }

    #[test]
    fn if_condition_errors_propagate() {
        let e = Expr::call("IF", vec![Expr::error(ErrorValue::NA), num(1.0), num(2.0)]);
        assert_eq!(eval(&e), Value::Error(ErrorValue::NA));
    }

    #[test]
    fn choose_and_iferror() {
        let e = Expr::call("CHOOSE", vec![num(2.0), Expr::text("a"), Expr::text("b")]);
        assert_eq!(eval(&e), Value::text("b"));
        let e = Expr::call("CHOOSE", vec![num(3.0), Expr::text("a"), Expr::text("b")]);
        assert_eq!(eval(&e), Value::Error(ErrorValue::VALUE));
        let e = Expr::call(
            "IFERROR",
            vec![Expr::binary("/", num(1.0), num(0.0)), num(-1.0)],
        );
        assert_eq!(eval(&e), Value::Number(-1.0));
    }

    #[test]
    fn connectives() {
        assert_eq!(eval(&Expr::call("AND", vec![num(1.0), num(2.0)])), Value::Number(1.0));
        assert_eq!(eval(&Expr::call("AND", vec![num(1.0), num(0.0)])), Value::Number(0.0));
        assert_eq!(eval(&Expr::call("OR", vec![num(0.0), num(3.0)])), Value::Number(1.0));
        assert_eq!(eval(&Expr::call("NOT", vec![num(0.0)])), Value::Number(1.0));
    }
}
