#![cfg(test)]

//! Small builders shared by unit tests.

use std::rc::Rc;

use tilecalc_common::{CellAddress, CellRefSpec, SheetId};

use crate::engine::{Cell, Workbook};
use crate::expr::Expr;
use crate::value::Value;

pub fn a1(s: &str) -> CellAddress {
    CellAddress::parse_a1(s).unwrap_or_else(|| panic!("bad address {s}"))
}

pub fn num(n: f64) -> Rc<Expr> {
    Expr::number(n)
}

/// Relative reference to `target` for a formula stored at `anchor`.
pub fn rel(target: &str, anchor: &str) -> Rc<Expr> {
    Expr::cell(CellRefSpec::relative(a1(target), a1(anchor)))
}

pub fn abs(target: &str) -> Rc<Expr> {
    Expr::cell(CellRefSpec::absolute(a1(target)))
}

/// Relative area `ul:lr` for a formula stored at `anchor`.
pub fn area(ul: &str, lr: &str, anchor: &str) -> Rc<Expr> {
    let anchor = a1(anchor);
    Expr::area(
        CellRefSpec::relative(a1(ul), anchor),
        CellRefSpec::relative(a1(lr), anchor),
    )
}

pub fn set_number(wb: &mut Workbook, sheet: SheetId, at: &str, n: f64) {
    let a = a1(at);
    wb.set_cell(sheet, a.col, a.row, Some(Cell::number(n))).unwrap();
}

pub fn set_formula(wb: &mut Workbook, sheet: SheetId, at: &str, e: Rc<Expr>) {
    let a = a1(at);
    wb.set_cell(sheet, a.col, a.row, Some(Cell::formula(e))).unwrap();
}

pub fn value(wb: &Workbook, sheet: SheetId, at: &str) -> Value {
    let a = a1(at);
    wb.eval_cell(sheet, a.col, a.row)
}
