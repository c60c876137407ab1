//! Row and column insertion.
//!
//! Every formula in the workbook is rewritten so its references keep
//! pointing at the same data, cells at or beyond the insertion point move,
//! and support sets are rebuilt. Formulas sharing one expression are
//! rewritten once per band of holder positions that rewrite identically.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tilecalc_common::{CellAddress, FullCellAddress, SheetId};

use super::cell::{CachedArrayFormula, Cell, CellContent};
use super::error::EngineError;
use super::recalc::RecalcReport;
use super::workbook::Workbook;
use crate::expr::{Expr, InsertSpec};

struct InsertMemo {
    ins: InsertSpec,
    breakpoints: FxHashMap<(*const Expr, SheetId), Vec<u32>>,
    exprs: FxHashMap<(*const Expr, SheetId, usize), Rc<Expr>>,
    arrays: FxHashMap<*const CachedArrayFormula, Rc<CachedArrayFormula>>,
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    rewrites: usize,
}

impl InsertMemo {
    fn new(ins: InsertSpec) -> Self {
        Self {
            ins,
            breakpoints: FxHashMap::default(),
            exprs: FxHashMap::default(),
            arrays: FxHashMap::default(),
            rewrites: 0,
        }
    }

    fn pos(&self, addr: CellAddress) -> u32 {
        if self.ins.rows { addr.row } else { addr.col }
    }

    fn shift(&self, host: SheetId, addr: CellAddress) -> CellAddress {
        if self.ins.rows {
            CellAddress::new(addr.col, self.ins.shifted(host, addr.row))
        } else {
            CellAddress::new(self.ins.shifted(host, addr.col), addr.row)
        }
    }

    /// `expr` rewritten for a holder at `pos` on `host`.
    fn expr(&mut self, expr: &Rc<Expr>, host: SheetId, pos: u32) -> Rc<Expr> {
        let ins = self.ins;
        let ptr = Rc::as_ptr(expr);
        let points = self.breakpoints.entry((ptr, host)).or_insert_with(|| {
            let mut points = Vec::new();
            expr.insert_breakpoints(&ins, host, &mut points);
            points.sort_unstable();
            points.dedup();
            points
        });
        let band = points.partition_point(|&b| b <= pos);
        let rewrites = &mut self.rewrites;
        let out = self.exprs.entry((ptr, host, band)).or_insert_with(|| {
            *rewrites += 1;
            expr.insert_row_cols(&ins, host, pos)
        });
        Rc::clone(out)
    }

    fn array(&mut self, caf: &Rc<CachedArrayFormula>) -> Rc<CachedArrayFormula> {
        if let Some(done) = self.arrays.get(&Rc::as_ptr(caf)) {
            return Rc::clone(done);
        }
        let host = caf.sheet();
        let pos = self.pos(caf.ul());
        let expr = self.expr(caf.expr(), host, pos);
        let moved = Rc::new(CachedArrayFormula::new(
            expr,
            host,
            self.shift(host, caf.ul()),
            self.shift(host, caf.lr()),
        ));
        self.arrays.insert(Rc::as_ptr(caf), Rc::clone(&moved));
        moved
    }
}

impl Workbook {
    /// Insert `count` rows (or columns, with `rows == false`) before index
    /// `at` of `sheet`, then rebuild support sets and recalculate in full.
    ///
    /// Fails without changing anything if the insertion would cut through
    /// an array formula or push a non-blank cell off the sheet.
    pub fn insert_row_cols(
        &mut self,
        sheet: SheetId,
        at: u32,
        count: u32,
        rows: bool,
    ) -> Result<RecalcReport, EngineError> {
        assert!(count > 0, "insert count must be positive");
        let target = self.sheet(sheet).ok_or(EngineError::UnknownSheet(sheet))?;
        let limit = if rows { target.rows() } else { target.cols() };
        if at >= limit {
            let (col, row) = if rows { (0, at) } else { (at, 0) };
            return Err(EngineError::OutOfBounds {
                sheet: target.name().to_string(),
                col,
                row,
            });
        }
        let ins = InsertSpec {
            sheet,
            at,
            count,
            rows,
        };
        let mut memo = InsertMemo::new(ins);

        for (addr, cell) in target.iter() {
            if cell.is_blank() {
                continue;
            }
            let pos = memo.pos(addr);
            if pos >= at && pos as u64 + count as u64 >= limit as u64 {
                return Err(EngineError::InsertOverflow {
                    sheet: target.name().to_string(),
                    count,
                });
            }
            if let Some(slot) = cell.array_slot_ref().filter(|s| s.is_anchor()) {
                let (lo, hi) = (memo.pos(slot.caf().ul()), memo.pos(slot.caf().lr()));
                if lo < at && at <= hi {
                    return Err(EngineError::WouldSplitArrayFormula {
                        at,
                        anchor: FullCellAddress { sheet, addr },
                    });
                }
            }
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("insert_row_cols", sheet, at, count, rows).entered();

        // Rewrite everything while the old cells still hold their
        // expressions, so pointer keys in the memo stay unique.
        let mut rebuilt: Vec<Vec<(CellAddress, Rc<Cell>)>> = Vec::with_capacity(self.sheets.len());
        for s in &self.sheets {
            let host = s.id();
            let mut cells = Vec::with_capacity(s.len());
            for (addr, cell) in s.iter() {
                let pos = memo.pos(addr);
                let moved = match cell.content() {
                    CellContent::Blank => continue,
                    CellContent::Formula(f) => Rc::new(Cell::formula(memo.expr(f.expr(), host, pos))),
                    CellContent::ArrayFormula(slot) => {
                        let (c, r) = slot.offset();
                        Rc::new(Cell::array_slot(memo.array(slot.caf()), c, r))
                    }
                    _ => Rc::clone(cell),
                };
                cells.push((memo.shift(host, addr), moved));
            }
            rebuilt.push(cells);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(rewrites = memo.rewrites, "formulas adjusted");
        drop(memo);

        for (s, cells) in self.sheets.iter_mut().zip(rebuilt) {
            s.take_cells();
            for (addr, cell) in cells {
                s.put(addr.col, addr.row, Some(cell));
            }
        }
        self.rebuild_support_sets();
        Ok(self.recalculate_full())
    }
}
