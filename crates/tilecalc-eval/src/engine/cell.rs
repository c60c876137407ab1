//! Sheet cells and the formula evaluation state machine.
//!
//! A formula cell moves through `Dirty → Enqueued → Computing → Uptodate`.
//! Evaluation is memoized: an up-to-date cell answers from its cache, and a
//! cell asked for its value while computing is part of a cycle.

use std::cell::{Cell as StateCell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tilecalc_common::{CellAddress, FullCellAddress, Interval, RefFormat, SheetId};

use super::support::SupportSet;
use super::workbook::Workbook;
use crate::expr::{Expr, ShowContext};
use crate::traits::EvalContext;
use crate::value::{Value, format_number};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CellState {
    Dirty,
    Enqueued,
    Computing,
    Uptodate,
}

/* ──────────────────────────── Formula ─────────────────────────────── */

/// A formula with its cached value.
pub struct Formula {
    expr: Rc<Expr>,
    state: StateCell<CellState>,
    value: RefCell<Value>,
}

impl Formula {
    pub fn new(expr: Rc<Expr>) -> Self {
        Self {
            expr,
            state: StateCell::new(CellState::Dirty),
            value: RefCell::new(Value::Empty),
        }
    }

    pub fn expr(&self) -> &Rc<Expr> {
        &self.expr
    }

    pub fn state(&self) -> CellState {
        self.state.get()
    }

    /// The cached value, if it is current.
    pub fn cached(&self) -> Option<Value> {
        (self.state.get() == CellState::Uptodate).then(|| self.value.borrow().clone())
    }

    /// Evaluate unless up to date. `on_computed` runs after a fresh value
    /// has been cached. Area results are resolved while still `Computing`,
    /// so an area covering the cell itself reads `#CYCLE!`.
    fn eval_at(&self, ctx: &EvalContext<'_>, on_computed: impl FnOnce()) -> Value {
        match self.state.get() {
            CellState::Uptodate => self.value.borrow().clone(),
            CellState::Computing => {
                ctx.workbook.report_cycle(ctx.full_address());
                Value::Error(tilecalc_common::ErrorValue::CYCLE)
            }
            CellState::Dirty | CellState::Enqueued => {
                self.state.set(CellState::Computing);
                let v = self.expr.eval(ctx).materialize(ctx.workbook);
                *self.value.borrow_mut() = v.clone();
                self.state.set(CellState::Uptodate);
                on_computed();
                v
            }
        }
    }

    /// Returns true if the state changed.
    fn mark_dirty(&self) -> bool {
        if self.state.get() == CellState::Dirty {
            return false;
        }
        self.state.set(CellState::Dirty);
        true
    }

    /// `Dirty → Enqueued`; returns true if that happened.
    fn enqueue(&self) -> bool {
        if self.state.get() != CellState::Dirty {
            return false;
        }
        self.state.set(CellState::Enqueued);
        true
    }

    fn reset(&self) {
        self.state.set(CellState::Dirty);
    }
}

/* ───────────────────────── Array formulas ─────────────────────────── */

/// A formula whose result fills the rectangle `ul..=lr`. Every cell of the
/// rectangle holds an [`ArrayFormula`] slot pointing here.
pub struct CachedArrayFormula {
    formula: Formula,
    sheet: SheetId,
    ul: CellAddress,
    lr: CellAddress,
}

impl CachedArrayFormula {
    pub(crate) fn new(expr: Rc<Expr>, sheet: SheetId, ul: CellAddress, lr: CellAddress) -> Self {
        Self {
            formula: Formula::new(expr),
            sheet,
            ul,
            lr,
        }
    }

    pub fn expr(&self) -> &Rc<Expr> {
        self.formula.expr()
    }

    pub fn state(&self) -> CellState {
        self.formula.state()
    }

    pub fn sheet(&self) -> SheetId {
        self.sheet
    }

    pub fn ul(&self) -> CellAddress {
        self.ul
    }

    pub fn lr(&self) -> CellAddress {
        self.lr
    }

    pub fn cols(&self) -> Interval {
        Interval::new(self.ul.col, self.lr.col)
    }

    pub fn rows(&self) -> Interval {
        Interval::new(self.ul.row, self.lr.row)
    }

    fn anchor(&self) -> FullCellAddress {
        FullCellAddress {
            sheet: self.sheet,
            addr: self.ul,
        }
    }

    fn eval(&self, wb: &Workbook) -> Value {
        let ctx = EvalContext::new(wb, self.sheet, self.ul.col, self.ul.row);
        self.formula.eval_at(&ctx, || {
            for c in self.cols() {
                for r in self.rows() {
                    if let Some(slot) = wb.cell(self.sheet, c, r) {
                        wb.enqueue_supported(slot);
                    }
                }
            }
        })
    }

    fn mark_dirty(&self, wb: &Workbook) {
        if self.formula.mark_dirty() {
            for c in self.cols() {
                for r in self.rows() {
                    if let Some(slot) = wb.cell(self.sheet, c, r) {
                        wb.mark_supported_dirty(slot);
                    }
                }
            }
        }
    }

    fn enqueue(&self, wb: &Workbook) {
        if self.formula.enqueue() {
            wb.push_queue(self.anchor());
        }
    }

    pub(crate) fn reset(&self) {
        self.formula.reset();
    }
}

/// One cell of an array formula's rectangle.
#[derive(Clone)]
pub struct ArrayFormula {
    caf: Rc<CachedArrayFormula>,
    /// Offset of this slot inside the rectangle.
    col: u32,
    row: u32,
}

impl ArrayFormula {
    pub fn caf(&self) -> &Rc<CachedArrayFormula> {
        &self.caf
    }

    pub fn offset(&self) -> (u32, u32) {
        (self.col, self.row)
    }

    pub fn is_anchor(&self) -> bool {
        self.col == 0 && self.row == 0
    }

    /// The slot's element of the array result. A scalar result fills every
    /// slot; a slot beyond the result's shape reads `#N/A`.
    fn eval(&self, wb: &Workbook) -> Value {
        match self.caf.eval(wb) {
            Value::Array(a) => a.get(wb, self.col, self.row),
            scalar => scalar,
        }
    }
}

/* ────────────────────────────── Cell ──────────────────────────────── */

pub enum CellContent {
    /// Holds nothing but a support set.
    Blank,
    Number(f64),
    Text(Rc<str>),
    /// Text entered with a leading quote, e.g. `'123`.
    QuotedText(Rc<str>),
    Formula(Formula),
    ArrayFormula(ArrayFormula),
}

/// One occupied slot of a sheet: content plus the cell's support set.
pub struct Cell {
    content: CellContent,
    support: RefCell<Option<SupportSet>>,
}

impl Cell {
    fn new(content: CellContent) -> Self {
        Self {
            content,
            support: RefCell::new(None),
        }
    }

    pub fn blank() -> Self {
        Self::new(CellContent::Blank)
    }

    pub fn number(n: f64) -> Self {
        Self::new(CellContent::Number(n))
    }

    pub fn text(s: &str) -> Self {
        Self::new(CellContent::Text(Rc::from(s)))
    }

    pub fn quoted_text(s: &str) -> Self {
        Self::new(CellContent::QuotedText(Rc::from(s)))
    }

    pub fn formula(expr: Rc<Expr>) -> Self {
        Self::new(CellContent::Formula(Formula::new(expr)))
    }

    pub(crate) fn array_slot(caf: Rc<CachedArrayFormula>, col: u32, row: u32) -> Self {
        Self::new(CellContent::ArrayFormula(ArrayFormula { caf, col, row }))
    }

    pub(crate) fn blank_with_support(support: SupportSet) -> Self {
        let cell = Self::blank();
        cell.set_support(Some(support));
        cell
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.content, CellContent::Blank)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.content, CellContent::Formula(_))
    }

    pub fn is_array_slot(&self) -> bool {
        matches!(self.content, CellContent::ArrayFormula(_))
    }

    pub fn array_slot_ref(&self) -> Option<&ArrayFormula> {
        match &self.content {
            CellContent::ArrayFormula(slot) => Some(slot),
            _ => None,
        }
    }

    /// The expression of an ordinary formula cell.
    pub fn formula_expr(&self) -> Option<&Rc<Expr>> {
        match &self.content {
            CellContent::Formula(f) => Some(f.expr()),
            _ => None,
        }
    }

    /// State of a formula or array-formula cell.
    pub fn state(&self) -> Option<CellState> {
        match &self.content {
            CellContent::Formula(f) => Some(f.state()),
            CellContent::ArrayFormula(slot) => Some(slot.caf.state()),
            _ => None,
        }
    }

    /// True for formulas calling a volatile function. Only the anchor slot
    /// of an array formula reports volatility.
    pub fn is_volatile(&self) -> bool {
        match &self.content {
            CellContent::Formula(f) => f.expr().is_volatile(),
            CellContent::ArrayFormula(slot) => slot.is_anchor() && slot.caf.expr().is_volatile(),
            _ => false,
        }
    }

    /* ───────────────────── evaluation protocol ───────────────────── */

    pub fn eval(&self, wb: &Workbook, sheet: SheetId, col: u32, row: u32) -> Value {
        match &self.content {
            CellContent::Blank => Value::Empty,
            CellContent::Number(n) => Value::Number(*n),
            CellContent::Text(s) | CellContent::QuotedText(s) => Value::Text(Rc::clone(s)),
            CellContent::Formula(f) => {
                let ctx = EvalContext::new(wb, sheet, col, row);
                f.eval_at(&ctx, || wb.enqueue_supported(self))
            }
            CellContent::ArrayFormula(slot) => slot.eval(wb),
        }
    }

    /// Invalidate this cell and, transitively, everything it supports.
    /// Already-dirty formulas stop the walk.
    pub fn mark_dirty(&self, wb: &Workbook) {
        match &self.content {
            CellContent::Formula(f) => {
                if f.mark_dirty() {
                    wb.mark_supported_dirty(self);
                }
            }
            CellContent::ArrayFormula(slot) => slot.caf.mark_dirty(wb),
            _ => wb.mark_supported_dirty(self),
        }
    }

    /// Queue a dirty formula for evaluation; constants forward to the
    /// cells they support.
    pub fn enqueue_for_evaluation(&self, wb: &Workbook, sheet: SheetId, col: u32, row: u32) {
        match &self.content {
            CellContent::Formula(f) => {
                if f.enqueue() {
                    wb.push_queue(FullCellAddress::new(sheet, col, row));
                }
            }
            CellContent::ArrayFormula(slot) => slot.caf.enqueue(wb),
            _ => wb.enqueue_supported(self),
        }
    }

    /// Forget any cached value.
    pub fn reset(&self) {
        match &self.content {
            CellContent::Formula(f) => f.reset(),
            CellContent::ArrayFormula(slot) => slot.caf.reset(),
            _ => {}
        }
    }

    /* ───────────────────── structural copies ─────────────────────── */

    /// A new cell with relative references shifted by (`dcol`, `drow`).
    /// The support set stays behind.
    pub fn move_contents(&self, dcol: i32, drow: i32) -> Cell {
        match &self.content {
            CellContent::Formula(f) => Cell::formula(f.expr().move_by(dcol, drow)),
            CellContent::ArrayFormula(slot) => Cell::formula(slot.caf.expr().move_by(dcol, drow)),
            _ => self.constant_copy(),
        }
    }

    /// A copy of this cell for (`col`, `row`). Formulas share their
    /// expression unless a reference would leave the sheet there.
    pub fn clone_cell(&self, col: u32, row: u32) -> Cell {
        match &self.content {
            CellContent::Formula(f) => Cell::formula(f.expr().copy_to(col, row)),
            CellContent::ArrayFormula(slot) => Cell::formula(slot.caf.expr().copy_to(col, row)),
            _ => self.constant_copy(),
        }
    }

    fn constant_copy(&self) -> Cell {
        Cell::new(match &self.content {
            CellContent::Number(n) => CellContent::Number(*n),
            CellContent::Text(s) => CellContent::Text(Rc::clone(s)),
            CellContent::QuotedText(s) => CellContent::QuotedText(Rc::clone(s)),
            _ => CellContent::Blank,
        })
    }

    /* ───────────────────────── support set ───────────────────────── */

    pub fn support(&self) -> Ref<'_, Option<SupportSet>> {
        self.support.borrow()
    }

    pub fn has_support(&self) -> bool {
        self.support.borrow().as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Record that `cols × rows` on `sheet` read this cell, located at `owner`.
    pub fn add_support(&self, owner: FullCellAddress, sheet: SheetId, cols: Interval, rows: Interval) {
        self.support
            .borrow_mut()
            .get_or_insert_with(SupportSet::new)
            .add_support(owner, sheet, cols, rows);
    }

    pub fn remove_supported(&self, supported: FullCellAddress) {
        if let Some(set) = self.support.borrow_mut().as_mut() {
            set.remove_cell(supported);
        }
    }

    pub(crate) fn take_support(&self) -> Option<SupportSet> {
        self.support.borrow_mut().take()
    }

    pub(crate) fn set_support(&self, support: Option<SupportSet>) {
        *self.support.borrow_mut() = support;
    }

    /* ─────────────────────────── display ─────────────────────────── */

    /// The cell as it would be typed: formulas start with `=`, array
    /// formulas are wrapped in braces, quoted text keeps its quote.
    pub fn show(&self, wb: &Workbook, sheet: SheetId, col: u32, row: u32, format: RefFormat) -> String {
        match &self.content {
            CellContent::Blank => String::new(),
            CellContent::Number(n) => format_number(*n),
            CellContent::Text(s) => s.to_string(),
            CellContent::QuotedText(s) => format!("'{s}"),
            CellContent::Formula(f) => {
                let ctx = ShowContext {
                    workbook: wb,
                    sheet,
                    anchor: CellAddress::new(col, row),
                    format,
                };
                format!("={}", f.expr().show(&ctx))
            }
            CellContent::ArrayFormula(slot) => {
                let ctx = ShowContext {
                    workbook: wb,
                    sheet: slot.caf.sheet,
                    anchor: slot.caf.ul,
                    format,
                };
                format!("{{={}}}", slot.caf.expr().show(&ctx))
            }
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Cell");
        match &self.content {
            CellContent::Blank => d.field("blank", &true),
            CellContent::Number(n) => d.field("number", n),
            CellContent::Text(s) => d.field("text", s),
            CellContent::QuotedText(s) => d.field("quoted_text", s),
            CellContent::Formula(fm) => d.field("formula", fm.expr()).field("state", &fm.state()),
            CellContent::ArrayFormula(slot) => d
                .field("array_formula", slot.caf.expr())
                .field("offset", &slot.offset()),
        };
        d.field("support", &self.support.borrow()).finish()
    }
}
