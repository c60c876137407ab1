//! Registering and removing a formula's references in support sets.
//!
//! A formula shared by a block of cells is registered once for the whole
//! block: every referenced cell receives the (possibly smaller) sub-block
//! of formula cells that actually read it.

use rustc_hash::FxHashSet;
use tilecalc_common::{
    CellAddress, CellRefSpec, FullCellAddress, Interval, MAX_COLS, MAX_ROWS, RaRef, SheetId,
};

use super::{CellArea, CellRef, Expr};

/// Receiver of support-set updates, implemented by the workbook.
pub trait SupportSink {
    /// Record that the cells `cols × rows` on `sheet` read `referred`.
    fn add_support(&mut self, referred: FullCellAddress, sheet: SheetId, cols: Interval, rows: Interval);

    /// Forget that `supported` reads `referred`.
    fn remove_support(&mut self, referred: FullCellAddress, supported: FullCellAddress);
}

/// One axis of a reference projected over a block of holder cells.
struct Axis {
    /// Indices referred to by at least one holder.
    referred: Interval,
    block: Interval,
    /// `None` for absolute axes.
    offsets: Option<(i64, i64)>,
}

enum AxisPlan {
    Axis(Axis),
    /// Nothing referred lies inside the sheet.
    Empty,
    /// One corner absolute and the other relative.
    Mixed,
}

impl Axis {
    fn plan(a: RaRef, b: RaRef, block: Interval, limit: u32) -> AxisPlan {
        if a.abs != b.abs {
            return AxisPlan::Mixed;
        }
        let lo = a.value.min(b.value) as i64;
        let hi = a.value.max(b.value) as i64;
        let (from, to, offsets) = if a.abs {
            (lo, hi, None)
        } else {
            (block.min() as i64 + lo, block.max() as i64 + hi, Some((lo, hi)))
        };
        let from = from.max(0);
        let to = to.min(limit as i64 - 1);
        if from > to {
            return AxisPlan::Empty;
        }
        AxisPlan::Axis(Axis {
            referred: Interval::new(from as u32, to as u32),
            block,
            offsets,
        })
    }

    /// Holders in the block that read index `t`.
    fn supported(&self, t: u32) -> Interval {
        match self.offsets {
            None => self.block,
            Some((lo, hi)) => {
                let t = t as i64;
                let min = (t - hi).max(self.block.min() as i64);
                let max = (t - lo).min(self.block.max() as i64);
                Interval::new(min as u32, max as u32)
            }
        }
    }
}

impl Expr {
    /// Register this formula, held by the block `cols × rows` whose upper
    /// left cell is (`col`, `row`) on `sheet`, in the support sets of every
    /// cell it references.
    pub fn add_to_support_sets(
        &self,
        sink: &mut dyn SupportSink,
        sheet: SheetId,
        col: u32,
        row: u32,
        cols: u32,
        rows: u32,
    ) {
        let block_cols = Interval::new(col, col + cols - 1);
        let block_rows = Interval::new(row, row + rows - 1);
        let mut seen = FxHashSet::default();
        let mut areas = Vec::new();
        let mut cells = Vec::new();
        self.visit_refs(&mut seen, &mut |r| cells.push(*r), &mut |a| areas.push(*a));
        for r in cells {
            let target = r.sheet.unwrap_or(sheet);
            add_block_support(sink, target, r.spec, r.spec, sheet, block_cols, block_rows);
        }
        for a in areas {
            let target = a.sheet.unwrap_or(sheet);
            add_block_support(sink, target, a.ul, a.lr, sheet, block_cols, block_rows);
        }
    }

    /// Undo [`add_to_support_sets`](Self::add_to_support_sets) for the
    /// single holder at (`col`, `row`).
    pub fn remove_from_support_sets(&self, sink: &mut dyn SupportSink, sheet: SheetId, col: u32, row: u32) {
        let anchor = CellAddress::new(col, row);
        let supported = FullCellAddress::new(sheet, col, row);
        let mut seen = FxHashSet::default();
        let mut cells: Vec<CellRef> = Vec::new();
        let mut areas: Vec<CellArea> = Vec::new();
        self.visit_refs(&mut seen, &mut |r| cells.push(*r), &mut |a| areas.push(*a));
        for r in cells {
            if let Some(t) = r.spec.resolve(anchor) {
                let target = r.sheet.unwrap_or(sheet);
                sink.remove_support(FullCellAddress::new(target, t.col, t.row), supported);
            }
        }
        for a in areas {
            let Some((acols, arows)) = a.resolve(anchor) else {
                continue;
            };
            let target = a.sheet.unwrap_or(sheet);
            for c in acols {
                for r in arows {
                    sink.remove_support(FullCellAddress::new(target, c, r), supported);
                }
            }
        }
    }
}

impl Expr {
    /// Call `act` for every cell this formula reads when held at
    /// (`col`, `row`) on `sheet`. Each distinct reference is walked once.
    pub fn for_each_referred(&self, sheet: SheetId, col: u32, row: u32, act: &mut dyn FnMut(FullCellAddress)) {
        let mut seen = FxHashSet::default();
        let mut cells = Vec::new();
        let mut areas = Vec::new();
        self.visit_refs(&mut seen, &mut |r| cells.push(*r), &mut |a| areas.push(*a));
        let anchor = CellAddress::new(col, row);
        for r in cells {
            walk_cell(&r, sheet, anchor, act);
        }
        for a in areas {
            walk_area(&a, sheet, anchor, act);
        }
    }

    /// Like [`for_each_referred`](Self::for_each_referred) but visits every
    /// occurrence, so a cell read twice is reported twice.
    pub fn depends_on(&self, sheet: SheetId, col: u32, row: u32, act: &mut dyn FnMut(FullCellAddress)) {
        let anchor = CellAddress::new(col, row);
        match self {
            Expr::CellRef(r) => walk_cell(r, sheet, anchor, act),
            Expr::CellArea(a) => walk_area(a, sheet, anchor, act),
            Expr::Call(call) => {
                for arg in call.args() {
                    arg.depends_on(sheet, col, row, act);
                }
            }
            _ => {}
        }
    }
}

fn walk_cell(r: &CellRef, sheet: SheetId, anchor: CellAddress, act: &mut dyn FnMut(FullCellAddress)) {
    if let Some(t) = r.spec.resolve(anchor) {
        act(FullCellAddress::new(r.sheet.unwrap_or(sheet), t.col, t.row));
    }
}

fn walk_area(a: &CellArea, sheet: SheetId, anchor: CellAddress, act: &mut dyn FnMut(FullCellAddress)) {
    if let Some((cols, rows)) = a.resolve(anchor) {
        let target = a.sheet.unwrap_or(sheet);
        for c in cols {
            for r in rows {
                act(FullCellAddress::new(target, c, r));
            }
        }
    }
}

fn add_block_support(
    sink: &mut dyn SupportSink,
    target: SheetId,
    ul: CellRefSpec,
    lr: CellRefSpec,
    sheet: SheetId,
    block_cols: Interval,
    block_rows: Interval,
) {
    let col_plan = Axis::plan(ul.col, lr.col, block_cols, MAX_COLS);
    let row_plan = Axis::plan(ul.row, lr.row, block_rows, MAX_ROWS);
    match (col_plan, row_plan) {
        (AxisPlan::Empty, _) | (_, AxisPlan::Empty) => {}
        (AxisPlan::Axis(cols), AxisPlan::Axis(rows)) => {
            // Outer loop over the axis with fewer referred indices.
            if cols.referred.len() <= rows.referred.len() {
                for c in cols.referred {
                    let sc = cols.supported(c);
                    for r in rows.referred {
                        sink.add_support(FullCellAddress::new(target, c, r), sheet, sc, rows.supported(r));
                    }
                }
            } else {
                for r in rows.referred {
                    let sr = rows.supported(r);
                    for c in cols.referred {
                        sink.add_support(FullCellAddress::new(target, c, r), sheet, cols.supported(c), sr);
                    }
                }
            }
        }
        _ => {
            // Mixed corners: resolve the area per holder.
            let area = CellArea {
                sheet: Some(target),
                ul,
                lr,
            };
            for hc in block_cols {
                for hr in block_rows {
                    let Some((acols, arows)) = area.resolve(CellAddress::new(hc, hr)) else {
                        continue;
                    };
                    for c in acols {
                        for r in arows {
                            sink.add_support(
                                FullCellAddress::new(target, c, r),
                                sheet,
                                Interval::point(hc),
                                Interval::point(hr),
                            );
                        }
                    }
                }
            }
        }
    }
}
