//! The workbook: sheets, edit bookkeeping and recalculation.
//!
//! Edits only record what changed. [`Workbook::recalculate`] then runs
//! three phases over the recorded cells: mark the transitive dependents
//! dirty, enqueue the dirty formulas, and drain the queue in FIFO order.
//! Values read between an edit and the next recalculation may be stale.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use tilecalc_common::{CellAddress, ErrorValue, FullCellAddress, Interval, SheetId};

use super::EvalConfig;
use super::cell::{CachedArrayFormula, Cell, CellContent};
use super::error::EngineError;
use super::recalc::RecalcReport;
use super::sheet::Sheet;
use super::support::VisitedAreas;
use crate::expr::{Expr, SupportSink};
use crate::value::Value;

pub struct Workbook {
    pub(super) sheets: Vec<Sheet>,
    pub(super) config: EvalConfig,
    queue: RefCell<VecDeque<FullCellAddress>>,
    pub(super) volatile: FxHashSet<FullCellAddress>,
    edited: Vec<FullCellAddress>,
    recalc_count: u64,
    visited: RefCell<VisitedAreas>,
    cycles: RefCell<Vec<FullCellAddress>>,
    rng: RefCell<SmallRng>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// A workbook with one empty sheet, `Sheet1`.
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.rand_seed);
        let mut wb = Workbook {
            sheets: Vec::new(),
            config,
            queue: RefCell::new(VecDeque::new()),
            volatile: FxHashSet::default(),
            edited: Vec::new(),
            recalc_count: 0,
            visited: RefCell::new(VisitedAreas::default()),
            cycles: RefCell::new(Vec::new()),
            rng: RefCell::new(rng),
        };
        let (cols, rows) = (wb.config.default_sheet_cols, wb.config.default_sheet_rows);
        wb.sheets.push(Sheet::new(0, "Sheet1", cols, rows));
        wb
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Switching support sets on rebuilds them; the next recalculation
    /// should be a full one.
    pub fn set_use_support_sets(&mut self, on: bool) {
        if on && !self.config.use_support_sets {
            self.config.use_support_sets = true;
            self.rebuild_support_sets();
        } else {
            self.config.use_support_sets = on;
        }
    }

    pub fn config_mut(&mut self) -> &mut EvalConfig {
        &mut self.config
    }

    /* ─────────────────────────── sheets ─────────────────────────── */

    /// Add an empty sheet with the configured default size.
    pub fn add_sheet(&mut self, name: &str) -> Result<SheetId, EngineError> {
        let (cols, rows) = (self.config.default_sheet_cols, self.config.default_sheet_rows);
        self.add_sheet_sized(name, cols, rows)
    }

    pub fn add_sheet_sized(&mut self, name: &str, cols: u32, rows: u32) -> Result<SheetId, EngineError> {
        self.check_sheet_name(name, None)?;
        let id = SheetId::try_from(self.sheets.len())
            .map_err(|_| EngineError::InvalidSheetName(name.to_string()))?;
        let cols = cols.clamp(1, tilecalc_common::MAX_COLS);
        let rows = rows.clamp(1, tilecalc_common::MAX_ROWS);
        self.sheets.push(Sheet::new(id, name, cols, rows));
        #[cfg(feature = "tracing")]
        tracing::debug!(sheet = id, name, "added sheet");
        Ok(id)
    }

    pub fn rename_sheet(&mut self, id: SheetId, name: &str) -> Result<(), EngineError> {
        self.check_sheet_name(name, Some(id))?;
        let sheet = self
            .sheets
            .get_mut(id as usize)
            .ok_or(EngineError::UnknownSheet(id))?;
        sheet.set_name(name);
        Ok(())
    }

    fn check_sheet_name(&self, name: &str, except: Option<SheetId>) -> Result<(), EngineError> {
        if name.trim().is_empty() || name.contains(['!', '[', ']', '*', '?', '/', '\\', ':']) {
            return Err(EngineError::InvalidSheetName(name.to_string()));
        }
        match self.sheet_by_name(name) {
            Some(id) if Some(id) != except => Err(EngineError::DuplicateSheetName(name.to_string())),
            _ => Ok(()),
        }
    }

    pub fn sheet(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.get(id as usize)
    }

    /// Case-insensitive lookup.
    pub fn sheet_by_name(&self, name: &str) -> Option<SheetId> {
        self.sheets
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .map(Sheet::id)
    }

    pub fn sheet_name(&self, id: SheetId) -> Option<&str> {
        self.sheet(id).map(Sheet::name)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> + '_ {
        self.sheets.iter()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /* ─────────────────────────── cells ──────────────────────────── */

    pub fn cell(&self, sheet: SheetId, col: u32, row: u32) -> Option<&Rc<Cell>> {
        self.sheets.get(sheet as usize)?.get(col, row)
    }

    pub(crate) fn cell_at(&self, at: FullCellAddress) -> Option<&Rc<Cell>> {
        self.cell(at.sheet, at.col(), at.row())
    }

    fn check(&self, sheet: SheetId, col: u32, row: u32) -> Result<FullCellAddress, EngineError> {
        let s = self.sheet(sheet).ok_or(EngineError::UnknownSheet(sheet))?;
        if !s.in_bounds(col, row) {
            return Err(EngineError::OutOfBounds {
                sheet: s.name().to_string(),
                col,
                row,
            });
        }
        Ok(FullCellAddress::new(sheet, col, row))
    }

    fn check_not_array(&self, at: FullCellAddress) -> Result<(), EngineError> {
        match self.cell_at(at) {
            Some(c) if c.is_array_slot() => Err(EngineError::PartOfArrayFormula(at)),
            _ => Ok(()),
        }
    }

    /// Store `cell` (or clear the slot with `None`) and register its
    /// formula in the support sets of the cells it reads. The change takes
    /// effect at the next [`recalculate`](Self::recalculate).
    pub fn set_cell(&mut self, sheet: SheetId, col: u32, row: u32, cell: Option<Cell>) -> Result<(), EngineError> {
        let at = self.check(sheet, col, row)?;
        self.check_not_array(at)?;
        self.install(at, cell, true);
        Ok(())
    }

    /// Replace whatever sits at `at`, keeping the support set and the
    /// volatile set consistent. `register` adds the new formula's own
    /// support entries; block operations register once for the block.
    pub(super) fn install(&mut self, at: FullCellAddress, cell: Option<Cell>, register: bool) {
        let (col, row) = (at.col(), at.row());
        let old = self.sheets[at.sheet as usize].put(col, row, None);
        let mut new = cell;
        if let Some(old) = old {
            self.decrease_volatile_set(&old, at);
            if let Some(expr) = old.formula_expr() {
                let expr = Rc::clone(expr);
                expr.remove_from_support_sets(self, at.sheet, col, row);
            }
            if let Some(support) = old.take_support().filter(|s| !s.is_empty()) {
                match &new {
                    Some(n) => n.set_support(Some(support)),
                    None => new = Some(Cell::blank_with_support(support)),
                }
            }
        }
        let new = new.filter(|c| !c.is_blank() || c.has_support()).map(Rc::new);
        if let Some(n) = &new {
            self.increase_volatile_set(n, at);
        }
        self.sheets[at.sheet as usize].put(col, row, new.clone());
        if register {
            if let Some(expr) = new.as_ref().and_then(|n| n.formula_expr()).cloned() {
                self.register(&expr, at.sheet, col, row, 1, 1);
            }
        }
        self.record_cell_change(at);
    }

    /// Support sets are only maintained while they are switched on.
    fn register(&mut self, expr: &Expr, sheet: SheetId, col: u32, row: u32, cols: u32, rows: u32) {
        if self.config.use_support_sets {
            expr.add_to_support_sets(self, sheet, col, row, cols, rows);
        }
    }

    /// Install `expr` as an array formula over the rectangle spanned by
    /// `ul` and `lr`. Every covered cell is replaced.
    pub fn set_array_formula(
        &mut self,
        sheet: SheetId,
        expr: Rc<Expr>,
        ul: CellAddress,
        lr: CellAddress,
    ) -> Result<(), EngineError> {
        self.check(sheet, ul.col, ul.row)?;
        self.check(sheet, lr.col, lr.row)?;
        let cols = Interval::spanning(ul.col, lr.col);
        let rows = Interval::spanning(ul.row, lr.row);
        for c in cols {
            for r in rows {
                self.check_not_array(FullCellAddress::new(sheet, c, r))?;
            }
        }
        let ul = CellAddress::new(cols.min(), rows.min());
        let lr = CellAddress::new(cols.max(), rows.max());
        let caf = Rc::new(CachedArrayFormula::new(Rc::clone(&expr), sheet, ul, lr));
        for c in cols {
            for r in rows {
                let slot = Cell::array_slot(Rc::clone(&caf), c - ul.col, r - ul.row);
                self.install(FullCellAddress::new(sheet, c, r), Some(slot), false);
            }
        }
        self.register(&expr, sheet, ul.col, ul.row, 1, 1);
        #[cfg(feature = "tracing")]
        tracing::debug!(sheet, %ul, %lr, "installed array formula");
        Ok(())
    }

    /// Remove the array formula covering (`col`, `row`), clearing its whole
    /// rectangle. Returns false if the cell is not part of one.
    pub fn remove_array_formula(&mut self, sheet: SheetId, col: u32, row: u32) -> Result<bool, EngineError> {
        let at = self.check(sheet, col, row)?;
        let Some(caf) = self
            .cell_at(at)
            .and_then(|c| c.array_slot_ref())
            .map(|slot| Rc::clone(slot.caf()))
        else {
            return Ok(false);
        };
        let ul = caf.ul();
        let expr = Rc::clone(caf.expr());
        expr.remove_from_support_sets(self, sheet, ul.col, ul.row);
        for c in caf.cols() {
            for r in caf.rows() {
                self.install(FullCellAddress::new(sheet, c, r), None, false);
            }
        }
        Ok(true)
    }

    /// Copy `src` into the `cols × rows` block whose upper left cell is
    /// (`col`, `row`). Copies share one expression where their references
    /// stay valid, and the block is registered in support sets as a whole.
    pub fn paste_cell(
        &mut self,
        sheet: SheetId,
        src: &Cell,
        col: u32,
        row: u32,
        cols: u32,
        rows: u32,
    ) -> Result<(), EngineError> {
        assert!(cols > 0 && rows > 0, "paste block must be non-empty");
        self.check(sheet, col, row)?;
        self.check(sheet, col + cols - 1, row + rows - 1)?;
        for c in col..col + cols {
            for r in row..row + rows {
                self.check_not_array(FullCellAddress::new(sheet, c, r))?;
            }
        }
        for c in col..col + cols {
            for r in row..row + rows {
                self.install(FullCellAddress::new(sheet, c, r), Some(src.clone_cell(c, r)), false);
            }
        }
        let shared = match src.content() {
            CellContent::Formula(f) => Some(Rc::clone(f.expr())),
            CellContent::ArrayFormula(slot) => Some(Rc::clone(slot.caf().expr())),
            _ => None,
        };
        if let Some(expr) = shared {
            let valid = |c: u32, r: u32| expr.refs_valid_at(CellAddress::new(c, r));
            let all_valid = (col..col + cols).all(|c| (row..row + rows).all(|r| valid(c, r)));
            if all_valid {
                self.register(&expr, sheet, col, row, cols, rows);
            } else {
                // Copies that became `#REF!` read nothing.
                for c in col..col + cols {
                    for r in row..row + rows {
                        if valid(c, r) {
                            self.register(&expr, sheet, c, r, 1, 1);
                        }
                    }
                }
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(sheet, col, row, cols, rows, "pasted block");
        Ok(())
    }

    /// Move the cell at `from` to `to`, clearing `from`. Relative
    /// references keep their offsets, so they follow the formula.
    pub fn move_cell(&mut self, sheet: SheetId, from: CellAddress, to: CellAddress) -> Result<(), EngineError> {
        self.move_cell_by(sheet, from, to, false)
    }

    /// Move the cell at `from` to `to`, adjusting relative references so
    /// they still point at the cells they pointed at before.
    pub fn move_cell_keep_targets(
        &mut self,
        sheet: SheetId,
        from: CellAddress,
        to: CellAddress,
    ) -> Result<(), EngineError> {
        self.move_cell_by(sheet, from, to, true)
    }

    fn move_cell_by(
        &mut self,
        sheet: SheetId,
        from: CellAddress,
        to: CellAddress,
        keep_targets: bool,
    ) -> Result<(), EngineError> {
        let src_at = self.check(sheet, from.col, from.row)?;
        let dst_at = self.check(sheet, to.col, to.row)?;
        self.check_not_array(src_at)?;
        self.check_not_array(dst_at)?;
        if src_at == dst_at {
            return Ok(());
        }
        let moved = self.cell_at(src_at).map(|src| {
            if keep_targets {
                let dcol = from.col as i32 - to.col as i32;
                let drow = from.row as i32 - to.row as i32;
                src.move_contents(dcol, drow)
            } else {
                src.move_contents(0, 0)
            }
        });
        self.install(src_at, None, true);
        self.install(dst_at, moved, true);
        Ok(())
    }

    /* ───────────────────────── evaluation ───────────────────────── */

    /// Value of a cell, evaluating it if needed. An unknown sheet reads
    /// `#REF!`; an empty slot reads as empty.
    pub fn eval_cell(&self, sheet: SheetId, col: u32, row: u32) -> Value {
        match self.sheets.get(sheet as usize) {
            None => Value::Error(ErrorValue::REF),
            Some(s) => match s.get(col, row) {
                Some(cell) => cell.eval(self, sheet, col, row),
                None => Value::Empty,
            },
        }
    }

    /// The cell as typed, e.g. `=SUM(A1:A3)`.
    pub fn show(&self, sheet: SheetId, col: u32, row: u32) -> String {
        self.cell(sheet, col, row)
            .map(|c| c.show(self, sheet, col, row, self.config.ref_format))
            .unwrap_or_default()
    }

    /// The cell's current value as text.
    pub fn show_value(&self, sheet: SheetId, col: u32, row: u32) -> String {
        self.eval_cell(sheet, col, row).show(self)
    }

    /// Bring every value up to date after the recorded edits.
    pub fn recalculate(&mut self) -> RecalcReport {
        if !self.config.use_support_sets {
            return self.recalculate_full();
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("recalculate", edits = self.edited.len()).entered();
        let start = Instant::now();
        self.cycles.borrow_mut().clear();
        self.recalc_count += 1;
        let edited = std::mem::take(&mut self.edited);
        let mut volatile: Vec<FullCellAddress> = self.volatile.iter().copied().collect();
        volatile.sort();

        self.visited.borrow_mut().clear();
        for &at in &edited {
            if let Some(cell) = self.cell_at(at) {
                for dep in self.supported_cells(cell) {
                    self.mark_cell_dirty(dep);
                }
            }
        }
        for &at in &volatile {
            self.mark_cell_dirty(at);
        }

        self.visited.borrow_mut().clear();
        for &at in &edited {
            if let Some(cell) = self.cell_at(at) {
                cell.enqueue_for_evaluation(self, at.sheet, at.col(), at.row());
                for dep in self.supported_cells(cell) {
                    self.enqueue_cell(dep);
                }
            }
        }
        for &at in &volatile {
            self.enqueue_cell(at);
        }

        self.visited.borrow_mut().clear();
        let evaluated = self.drain_queue();
        self.finish_report(evaluated, false, start)
    }

    /// Re-evaluate every formula, ignoring dirtiness.
    pub fn recalculate_full(&mut self) -> RecalcReport {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("recalculate_full").entered();
        let start = Instant::now();
        self.cycles.borrow_mut().clear();
        self.recalc_count += 1;
        self.edited.clear();
        self.queue.borrow_mut().clear();
        let formulas = self.formula_addresses();
        for &at in &formulas {
            if let Some(cell) = self.cell_at(at) {
                cell.reset();
            }
        }
        for &at in &formulas {
            self.eval_cell(at.sheet, at.col(), at.row());
        }
        self.visited.borrow_mut().clear();
        self.drain_queue();
        self.finish_report(formulas.len(), true, start)
    }

    /// Rebuild every support set from the formulas, then recalculate in full.
    pub fn recalculate_full_rebuild(&mut self) -> RecalcReport {
        self.rebuild_support_sets();
        self.recalculate_full()
    }

    fn finish_report(&self, cells_evaluated: usize, full: bool, start: Instant) -> RecalcReport {
        let report = RecalcReport {
            recalc_count: self.recalc_count,
            cells_evaluated,
            cycle_culprits: self.cycles.borrow().clone(),
            full,
            elapsed: start.elapsed(),
        };
        #[cfg(feature = "tracing")]
        {
            tracing::debug!(summary = %report.summary(), "recalculation finished");
            if report.had_cycles() {
                tracing::warn!(cycles = report.cycle_culprits.len(), "cyclic formulas found");
            }
        }
        report
    }

    fn drain_queue(&self) -> usize {
        let mut evaluated = 0;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(at) = next else {
                break;
            };
            evaluated += 1;
            #[cfg(feature = "tracing")]
            tracing::trace!(cell = %at, "evaluating");
            self.eval_cell(at.sheet, at.col(), at.row());
        }
        evaluated
    }

    /// Cells holding a formula, plus the anchor of each array formula.
    fn formula_addresses(&self) -> Vec<FullCellAddress> {
        let mut out = Vec::new();
        for sheet in &self.sheets {
            for (addr, cell) in sheet.iter() {
                let is_root = cell.is_formula() || cell.array_slot_ref().is_some_and(|s| s.is_anchor());
                if is_root {
                    out.push(FullCellAddress {
                        sheet: sheet.id(),
                        addr,
                    });
                }
            }
        }
        out
    }

    /// Drop every support set and register all formulas afresh. Blank
    /// cells that only held support are removed first. Also rebuilds the
    /// volatile set.
    pub(super) fn rebuild_support_sets(&mut self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("rebuild_support_sets").entered();
        for sheet in &mut self.sheets {
            let mut holders = Vec::new();
            for (addr, cell) in sheet.iter() {
                cell.set_support(None);
                if cell.is_blank() {
                    holders.push(addr);
                }
            }
            for addr in holders {
                sheet.put(addr.col, addr.row, None);
            }
        }
        self.volatile.clear();
        for at in self.formula_addresses() {
            let Some(cell) = self.cell_at(at).cloned() else {
                continue;
            };
            if cell.is_volatile() {
                self.volatile.insert(at);
            }
            let expr = match cell.array_slot_ref() {
                Some(slot) => Rc::clone(slot.caf().expr()),
                None => match cell.formula_expr() {
                    Some(e) => Rc::clone(e),
                    None => continue,
                },
            };
            self.register(&expr, at.sheet, at.col(), at.row(), 1, 1);
        }
    }

    /* ──────────────────────── bookkeeping ───────────────────────── */

    /// Number of recalculations run so far.
    pub fn recalc_count(&self) -> u64 {
        self.recalc_count
    }

    pub fn record_cell_change(&mut self, at: FullCellAddress) {
        self.edited.push(at);
    }

    /// Edits not yet seen by a recalculation.
    pub fn pending_edits(&self) -> &[FullCellAddress] {
        &self.edited
    }

    pub fn increase_volatile_set(&mut self, cell: &Cell, at: FullCellAddress) {
        if cell.is_volatile() {
            self.volatile.insert(at);
        }
    }

    pub fn decrease_volatile_set(&mut self, cell: &Cell, at: FullCellAddress) {
        if cell.is_volatile() {
            self.volatile.remove(&at);
        }
    }

    pub fn is_volatile(&self, at: FullCellAddress) -> bool {
        self.volatile.contains(&at)
    }

    pub fn volatile_count(&self) -> usize {
        self.volatile.len()
    }

    /// A uniform sample from `[0, 1)`, reproducible for the configured seed.
    pub fn next_random(&self) -> f64 {
        self.rng.borrow_mut().r#gen::<f64>()
    }

    /// Cycle culprits found by the most recent recalculation.
    pub fn last_cycles(&self) -> Vec<FullCellAddress> {
        self.cycles.borrow().clone()
    }

    pub(crate) fn report_cycle(&self, at: FullCellAddress) {
        #[cfg(feature = "tracing")]
        tracing::debug!(cell = %at, "cycle detected");
        let mut cycles = self.cycles.borrow_mut();
        if cycles.len() < self.config.max_cycle_reports && !cycles.contains(&at) {
            cycles.push(at);
        }
    }

    /// The cells `cell` supports. With idempotent visits on, area cells
    /// already visited in the current phase are left out.
    pub fn supported_cells(&self, cell: &Cell) -> Vec<FullCellAddress> {
        let support = cell.support();
        let Some(set) = support.as_ref() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if self.config.idempotent_support_visits {
            let mut visited = self.visited.borrow_mut();
            set.for_each_supported(Some(&mut *visited), |at| out.push(at));
        } else {
            set.for_each_supported(None, |at| out.push(at));
        }
        out
    }

    pub(crate) fn mark_cell_dirty(&self, at: FullCellAddress) {
        if let Some(cell) = self.cell_at(at) {
            cell.mark_dirty(self);
        }
    }

    pub(crate) fn mark_supported_dirty(&self, cell: &Cell) {
        for at in self.supported_cells(cell) {
            self.mark_cell_dirty(at);
        }
    }

    pub(crate) fn enqueue_cell(&self, at: FullCellAddress) {
        if let Some(cell) = self.cell_at(at) {
            cell.enqueue_for_evaluation(self, at.sheet, at.col(), at.row());
        }
    }

    pub(crate) fn enqueue_supported(&self, cell: &Cell) {
        if !self.config.use_support_sets {
            return;
        }
        for at in self.supported_cells(cell) {
            self.enqueue_cell(at);
        }
    }

    pub(crate) fn push_queue(&self, at: FullCellAddress) {
        self.queue.borrow_mut().push_back(at);
    }
}

impl SupportSink for Workbook {
    /// Creates a blank holder when the referred cell is empty. References
    /// to unknown sheets or outside the sheet are dropped.
    fn add_support(&mut self, referred: FullCellAddress, sheet: SheetId, cols: Interval, rows: Interval) {
        let Some(target) = self.sheets.get_mut(referred.sheet as usize) else {
            return;
        };
        let (col, row) = (referred.col(), referred.row());
        if !target.in_bounds(col, row) {
            return;
        }
        let cell = match target.get(col, row) {
            Some(c) => Rc::clone(c),
            None => {
                let holder = Rc::new(Cell::blank());
                target.put(col, row, Some(Rc::clone(&holder)));
                holder
            }
        };
        cell.add_support(referred, sheet, cols, rows);
    }

    /// Blank holders left with no support are dropped.
    fn remove_support(&mut self, referred: FullCellAddress, supported: FullCellAddress) {
        let Some(target) = self.sheets.get_mut(referred.sheet as usize) else {
            return;
        };
        let (col, row) = (referred.col(), referred.row());
        let Some(cell) = target.get(col, row) else {
            return;
        };
        cell.remove_supported(supported);
        if cell.is_blank() && !cell.has_support() {
            target.put(col, row, None);
        }
    }
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("sheets", &self.sheets.len())
            .field("recalc_count", &self.recalc_count)
            .field("pending_edits", &self.edited.len())
            .field("volatile", &self.volatile.len())
            .finish()
    }
}
