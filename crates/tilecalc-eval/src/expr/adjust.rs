//! Structural rewrites: moving, copying and row/column insertion.
//!
//! Each rewrite returns the input `Rc` when the result would be identical,
//! so unaffected subtrees and shared formulas stay shared.

use std::rc::Rc;

use tilecalc_common::{CellAddress, CellRefSpec, ErrorValue, RaRef, SheetId};

use super::{CellArea, CellRef, Expr};

/// `count` rows (or columns) inserted before index `at` of `sheet`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct InsertSpec {
    pub sheet: SheetId,
    pub at: u32,
    pub count: u32,
    pub rows: bool,
}

impl InsertSpec {
    /// New index on the insertion axis of a cell at `pos` on `host`.
    pub fn shifted(&self, host: SheetId, pos: u32) -> u32 {
        if host == self.sheet && pos >= self.at {
            pos + self.count
        } else {
            pos
        }
    }

    fn axis(&self, spec: CellRefSpec) -> RaRef {
        if self.rows { spec.row } else { spec.col }
    }

    fn with_axis(&self, spec: CellRefSpec, r: RaRef) -> CellRefSpec {
        if self.rows {
            CellRefSpec::new(spec.col, r)
        } else {
            CellRefSpec::new(r, spec.row)
        }
    }

    fn adjust(&self, spec: CellRefSpec, targets_sheet: bool, host: SheetId, pos: u32) -> CellRefSpec {
        let new_pos = self.shifted(host, pos);
        let r = self.axis(spec);
        let adjusted = if targets_sheet {
            r.shift_for_insert(pos, new_pos, self.at, self.count)
        } else {
            r.shift_for_insert(pos, new_pos, u32::MAX, 0)
        };
        self.with_axis(spec, adjusted)
    }
}

impl Expr {
    /// Shift every relative reference by (`dcol`, `drow`).
    pub fn move_by(self: &Rc<Self>, dcol: i32, drow: i32) -> Rc<Expr> {
        self.rewrite(&mut |spec, _| spec.move_by(dcol, drow))
    }

    /// The expression as it should be stored at (`col`, `row`): shared
    /// unchanged when every reference still resolves there, otherwise a
    /// `#REF!` constant.
    pub fn copy_to(self: &Rc<Self>, col: u32, row: u32) -> Rc<Expr> {
        if self.refs_valid_at(CellAddress::new(col, row)) {
            Rc::clone(self)
        } else {
            Expr::error(ErrorValue::REF)
        }
    }

    /// Rewrite for an insertion, for a holder at index `pos` (on the
    /// insertion axis) of sheet `host`.
    pub(crate) fn insert_row_cols(self: &Rc<Self>, ins: &InsertSpec, host: SheetId, pos: u32) -> Rc<Expr> {
        self.rewrite(&mut |spec, sheet| {
            let targets_sheet = sheet.unwrap_or(host) == ins.sheet;
            ins.adjust(spec, targets_sheet, host, pos)
        })
    }

    /// Holder positions at which the insertion rewrite changes: the result
    /// for a holder at `pos` equals the result for every position in the
    /// same band between consecutive breakpoints.
    pub(crate) fn insert_breakpoints(&self, ins: &InsertSpec, host: SheetId, out: &mut Vec<u32>) {
        if host == ins.sheet {
            out.push(ins.at);
        }
        let mut add = |spec: CellRefSpec, sheet: Option<SheetId>| {
            let r = ins.axis(spec);
            if !r.abs && sheet.unwrap_or(host) == ins.sheet {
                // Target crosses `at` when pos + offset == at.
                let b = ins.at as i64 - r.value as i64;
                if b > 0 && b <= u32::MAX as i64 {
                    out.push(b as u32);
                }
            }
        };
        self.for_each_spec(&mut add);
    }

    fn for_each_spec(&self, act: &mut dyn FnMut(CellRefSpec, Option<SheetId>)) {
        match self {
            Expr::CellRef(r) => act(r.spec, r.sheet),
            Expr::CellArea(a) => {
                act(a.ul, a.sheet);
                act(a.lr, a.sheet);
            }
            Expr::Call(call) => {
                for arg in &call.args {
                    arg.for_each_spec(act);
                }
            }
            _ => {}
        }
    }

    fn rewrite(self: &Rc<Self>, f: &mut dyn FnMut(CellRefSpec, Option<SheetId>) -> CellRefSpec) -> Rc<Expr> {
        match &**self {
            Expr::CellRef(r) => {
                let spec = f(r.spec, r.sheet);
                if spec == r.spec {
                    Rc::clone(self)
                } else {
                    Rc::new(Expr::CellRef(CellRef { sheet: r.sheet, spec }))
                }
            }
            Expr::CellArea(a) => {
                let ul = f(a.ul, a.sheet);
                let lr = f(a.lr, a.sheet);
                if ul == a.ul && lr == a.lr {
                    Rc::clone(self)
                } else {
                    Rc::new(Expr::CellArea(CellArea { sheet: a.sheet, ul, lr }))
                }
            }
            Expr::Call(call) => {
                let args: Vec<Rc<Expr>> = call.args.iter().map(|a| a.rewrite(f)).collect();
                if args.iter().zip(&call.args).all(|(new, old)| Rc::ptr_eq(new, old)) {
                    Rc::clone(self)
                } else {
                    Rc::new(Expr::Call(call.with_args(args)))
                }
            }
            _ => Rc::clone(self),
        }
    }
}
