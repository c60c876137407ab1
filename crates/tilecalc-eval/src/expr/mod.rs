//! Formula expression trees.
//!
//! Expressions are immutable and shared through `Rc`: a block of copied
//! formulas holds one tree, and every rewrite (move, insert) returns the
//! original `Rc` when nothing changed.

mod adjust;
mod deps;
mod show;

pub(crate) use adjust::InsertSpec;
pub use deps::SupportSink;
pub use show::ShowContext;

use std::{fmt, rc::Rc, sync::Arc};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tilecalc_common::{CellAddress, CellRefSpec, ErrorValue, Interval, SheetId};

use crate::function::{ArgMode, Function};
use crate::function_registry;
use crate::traits::{ArgumentHandle, EvalContext};
use crate::value::{ArrayValue, Value};

pub enum Expr {
    Number(f64),
    Text(Rc<str>),
    /// Any other constant, e.g. an array literal.
    Value(Value),
    Error(ErrorValue),
    CellRef(CellRef),
    CellArea(CellArea),
    Call(FunCall),
}

/// A single-cell reference. `sheet: None` means the holder's own sheet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub sheet: Option<SheetId>,
    pub spec: CellRefSpec,
}

/// A rectangular area given by two corner references.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CellArea {
    pub sheet: Option<SheetId>,
    pub ul: CellRefSpec,
    pub lr: CellRefSpec,
}

pub struct FunCall {
    name: Rc<str>,
    function: Option<Arc<dyn Function>>,
    args: Vec<Rc<Expr>>,
}

/* ───────────────────────────── builders ───────────────────────────── */

impl Expr {
    pub fn number(n: f64) -> Rc<Expr> {
        Rc::new(Expr::Number(n))
    }

    pub fn text(s: &str) -> Rc<Expr> {
        Rc::new(Expr::Text(Rc::from(s)))
    }

    pub fn error(e: ErrorValue) -> Rc<Expr> {
        Rc::new(Expr::Error(e))
    }

    pub fn value(v: Value) -> Rc<Expr> {
        Rc::new(Expr::Value(v))
    }

    pub fn cell(spec: CellRefSpec) -> Rc<Expr> {
        Rc::new(Expr::CellRef(CellRef { sheet: None, spec }))
    }

    pub fn sheet_cell(sheet: SheetId, spec: CellRefSpec) -> Rc<Expr> {
        Rc::new(Expr::CellRef(CellRef {
            sheet: Some(sheet),
            spec,
        }))
    }

    pub fn area(ul: CellRefSpec, lr: CellRefSpec) -> Rc<Expr> {
        Rc::new(Expr::CellArea(CellArea { sheet: None, ul, lr }))
    }

    pub fn sheet_area(sheet: SheetId, ul: CellRefSpec, lr: CellRefSpec) -> Rc<Expr> {
        Rc::new(Expr::CellArea(CellArea {
            sheet: Some(sheet),
            ul,
            lr,
        }))
    }

    /// A call to the registered function `name`; operators are functions
    /// too (`"+"`, `"&"`, `"NEG"`, …). Unknown names evaluate to `#NAME?`.
    pub fn call(name: &str, args: Vec<Rc<Expr>>) -> Rc<Expr> {
        Rc::new(Expr::Call(FunCall::new(name, args)))
    }

    pub fn binary(op: &str, lhs: Rc<Expr>, rhs: Rc<Expr>) -> Rc<Expr> {
        Self::call(op, vec![lhs, rhs])
    }
}

impl FunCall {
    pub fn new(name: &str, args: Vec<Rc<Expr>>) -> Self {
        let function = function_registry::get(name);
        let name = match &function {
            Some(f) => Rc::from(f.name()),
            None => Rc::from(name.to_ascii_uppercase()),
        };
        Self {
            name,
            function,
            args,
        }
    }

    fn with_args(&self, args: Vec<Rc<Expr>>) -> Self {
        Self {
            name: Rc::clone(&self.name),
            function: self.function.clone(),
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> Option<&Arc<dyn Function>> {
        self.function.as_ref()
    }

    pub fn args(&self) -> &[Rc<Expr>] {
        &self.args
    }

    fn eval(&self, ctx: &EvalContext<'_>) -> Value {
        let Some(f) = &self.function else {
            return Value::Error(ErrorValue::NAME);
        };
        let n = self.args.len();
        if n < f.min_args() || f.max_args().is_some_and(|max| n > max) {
            return Value::Error(ErrorValue::VALUE);
        }
        let handles: SmallVec<[ArgumentHandle<'_, '_>; 4]> = self
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| match f.arg_mode(i) {
                ArgMode::Eager => ArgumentHandle::eager(arg, ctx),
                ArgMode::Deferred => ArgumentHandle::deferred(arg, ctx),
            })
            .collect();
        f.eval(&handles, ctx).unwrap_or_else(Value::Error)
    }
}

/* ──────────────────────────── evaluation ──────────────────────────── */

impl Expr {
    pub fn eval(&self, ctx: &EvalContext<'_>) -> Value {
        match self {
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(s) => Value::Text(Rc::clone(s)),
            Expr::Value(v) => v.clone(),
            Expr::Error(e) => Value::Error(*e),
            Expr::CellRef(r) => r.eval(ctx),
            Expr::CellArea(a) => a.eval(ctx),
            Expr::Call(call) => call.eval(ctx),
        }
    }

    /// True if evaluating this expression calls a volatile function.
    pub fn is_volatile(&self) -> bool {
        match self {
            Expr::Call(call) => {
                call.function.as_ref().is_some_and(|f| f.volatile())
                    || call.args.iter().any(|a| a.is_volatile())
            }
            _ => false,
        }
    }

    /// True if every reference resolves when the expression sits at `anchor`.
    pub fn refs_valid_at(&self, anchor: CellAddress) -> bool {
        match self {
            Expr::CellRef(r) => r.spec.resolve(anchor).is_some(),
            Expr::CellArea(a) => a.ul.resolve(anchor).is_some() && a.lr.resolve(anchor).is_some(),
            Expr::Call(call) => call.args.iter().all(|a| a.refs_valid_at(anchor)),
            _ => true,
        }
    }

    /// Visit each distinct reference once, in tree order.
    pub(crate) fn visit_refs(
        &self,
        seen: &mut FxHashSet<RefKey>,
        on_cell: &mut dyn FnMut(&CellRef),
        on_area: &mut dyn FnMut(&CellArea),
    ) {
        match self {
            Expr::CellRef(r) => {
                if seen.insert(RefKey::Cell(*r)) {
                    on_cell(r);
                }
            }
            Expr::CellArea(a) => {
                if seen.insert(RefKey::Area(*a)) {
                    on_area(a);
                }
            }
            Expr::Call(call) => {
                for arg in &call.args {
                    arg.visit_refs(seen, on_cell, on_area);
                }
            }
            _ => {}
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RefKey {
    Cell(CellRef),
    Area(CellArea),
}

impl CellRef {
    fn eval(&self, ctx: &EvalContext<'_>) -> Value {
        let sheet = self.sheet.unwrap_or(ctx.sheet);
        match self.spec.resolve(ctx.anchor) {
            Some(target) => ctx.workbook.eval_cell(sheet, target.col, target.row),
            None => Value::Error(ErrorValue::REF),
        }
    }
}

impl CellArea {
    /// The area's column and row spans as seen from `anchor`.
    pub fn resolve(&self, anchor: CellAddress) -> Option<(Interval, Interval)> {
        let ul = self.ul.resolve(anchor)?;
        let lr = self.lr.resolve(anchor)?;
        Some((
            Interval::spanning(ul.col, lr.col),
            Interval::spanning(ul.row, lr.row),
        ))
    }

    fn eval(&self, ctx: &EvalContext<'_>) -> Value {
        let sheet = self.sheet.unwrap_or(ctx.sheet);
        if ctx.workbook.sheet(sheet).is_none() {
            return Value::Error(ErrorValue::REF);
        }
        match self.resolve(ctx.anchor) {
            Some((cols, rows)) => Value::Array(ArrayValue::view(
                sheet,
                CellAddress::new(cols.min(), rows.min()),
                cols.len() as u32,
                rows.len() as u32,
            )),
            None => Value::Error(ErrorValue::REF),
        }
    }
}

/* ────────────────────────────── Debug ─────────────────────────────── */

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "Number({n})"),
            Expr::Text(s) => write!(f, "Text({s:?})"),
            Expr::Value(v) => write!(f, "Value({v:?})"),
            Expr::Error(e) => write!(f, "Error({e})"),
            Expr::CellRef(r) => write!(f, "{r:?}"),
            Expr::CellArea(a) => write!(f, "{a:?}"),
            Expr::Call(call) => write!(f, "{call:?}"),
        }
    }
}

impl fmt::Debug for FunCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunCall")
            .field("name", &self.name)
            .field("resolved", &self.function.is_some())
            .field("args", &self.args)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Workbook;
    use crate::test_utils::{a1, num, rel};

    #[test]
    fn unknown_function_is_name_error() {
        let wb = Workbook::new();
        let ctx = EvalContext::new(&wb, 0, 0, 0);
        let e = Expr::call("NO_SUCH_FN", vec![num(1.0)]);
        assert_eq!(e.eval(&ctx), Value::Error(ErrorValue::NAME));
    }

    #[test]
    fn wrong_arity_is_value_error() {
        let wb = Workbook::new();
        let ctx = EvalContext::new(&wb, 0, 0, 0);
        let e = Expr::call("NOT", vec![num(1.0), num(2.0)]);
        assert_eq!(e.eval(&ctx), Value::Error(ErrorValue::VALUE));
    }

    #[test]
    fn reference_off_sheet_is_ref_error() {
        let wb = Workbook::new();
        let ctx = EvalContext::new(&wb, 0, 0, 0);
        // One column left of A1.
        let e = Expr::cell(CellRefSpec::new(
            tilecalc_common::RaRef::relative(-1),
            tilecalc_common::RaRef::relative(0),
        ));
        assert_eq!(e.eval(&ctx), Value::Error(ErrorValue::REF));
        assert!(!e.refs_valid_at(a1("A1")));
        assert!(e.refs_valid_at(a1("B1")));
    }

    #[test]
    fn volatility_is_found_in_nested_calls() {
        let e = Expr::binary("+", num(1.0), Expr::call("RAND", vec![]));
        assert!(e.is_volatile());
        assert!(!Expr::binary("+", num(1.0), rel("A1", "B1")).is_volatile());
    }

    #[test]
    fn repeated_references_are_visited_once() {
        let r = rel("A1", "C1");
        let e = Expr::binary("+", Rc::clone(&r), Expr::binary("*", r, rel("B1", "C1")));
        let mut seen = FxHashSet::default();
        let mut cells = 0;
        e.visit_refs(&mut seen, &mut |_| cells += 1, &mut |_| {});
        assert_eq!(cells, 2);
    }
}
