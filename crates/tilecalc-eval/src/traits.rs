use tilecalc_common::{CellAddress, ErrorValue, FullCellAddress, SheetId};

use crate::engine::Workbook;
use crate::expr::Expr;
use crate::value::Value;

/// Where an expression is being evaluated: the workbook, plus the sheet
/// and cell that hold the formula. Relative references resolve against
/// `anchor`.
#[derive(Clone, Copy)]
pub struct EvalContext<'w> {
    pub workbook: &'w Workbook,
    pub sheet: SheetId,
    pub anchor: CellAddress,
}

impl<'w> EvalContext<'w> {
    pub fn new(workbook: &'w Workbook, sheet: SheetId, col: u32, row: u32) -> Self {
        Self {
            workbook,
            sheet,
            anchor: CellAddress::new(col, row),
        }
    }

    pub fn full_address(&self) -> FullCellAddress {
        FullCellAddress {
            sheet: self.sheet,
            addr: self.anchor,
        }
    }
}

/// One argument of a function call.
///
/// Eager arguments arrive already evaluated. Deferred ones are evaluated
/// each time [`value`](Self::value) is called, so a branch that is never
/// asked for is never computed.
pub struct ArgumentHandle<'a, 'b> {
    expr: &'a Expr,
    ctx: &'a EvalContext<'b>,
    evaluated: Option<Value>,
}

impl<'a, 'b> ArgumentHandle<'a, 'b> {
    pub(crate) fn eager(expr: &'a Expr, ctx: &'a EvalContext<'b>) -> Self {
        Self {
            expr,
            ctx,
            evaluated: Some(expr.eval(ctx)),
        }
    }

    pub(crate) fn deferred(expr: &'a Expr, ctx: &'a EvalContext<'b>) -> Self {
        Self {
            expr,
            ctx,
            evaluated: None,
        }
    }

    pub fn value(&self) -> Value {
        match &self.evaluated {
            Some(v) => v.clone(),
            None => self.expr.eval(self.ctx),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.evaluated.is_none()
    }

    pub fn expr(&self) -> &'a Expr {
        self.expr
    }

    /// The argument coerced to a number.
    pub fn number(&self) -> Result<f64, ErrorValue> {
        self.value().to_number(self.ctx.workbook)
    }

    /// The argument coerced to a truth value.
    pub fn truthy(&self) -> Result<bool, ErrorValue> {
        self.value().to_bool(self.ctx.workbook)
    }
}
