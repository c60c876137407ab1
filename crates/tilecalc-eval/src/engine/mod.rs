//! Tilecalc recalculation engine
//!
//! Cells live in sparse tiled sheets. Each referenced cell carries a
//! support set naming the cells whose formulas read it, and edits are
//! propagated along those sets by a FIFO recalculation pass.

pub mod cell;
pub mod error;
pub mod grid;
pub mod recalc;
pub mod sheet;
pub mod support;
pub mod workbook;

mod insert;

#[cfg(test)]
mod tests;

pub use cell::{ArrayFormula, CachedArrayFormula, Cell, CellContent, CellState, Formula};
pub use error::EngineError;
pub use grid::SheetRep;
pub use recalc::RecalcReport;
pub use sheet::Sheet;
pub use support::{SupportArea, SupportRange, SupportSet, VisitedAreas};
pub use workbook::Workbook;

use tilecalc_common::{MAX_COLS, MAX_ROWS, RefFormat};

/// Configuration for the recalculation engine
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Track dependents through support sets. When off, every recalculation
    /// re-evaluates every formula.
    pub use_support_sets: bool,
    /// Skip support-area cells already visited in the current propagation
    /// phase. Pays off when many formulas read overlapping areas.
    pub idempotent_support_visits: bool,
    /// Reference style used when rendering formulas.
    pub ref_format: RefFormat,
    pub default_sheet_cols: u32,
    pub default_sheet_rows: u32,
    /// Seed for `RAND()`; recalculations are reproducible for a given seed.
    pub rand_seed: u64,
    /// Cycle culprits kept per recalculation; further cycles are counted
    /// but not recorded.
    pub max_cycle_reports: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            use_support_sets: true,
            idempotent_support_visits: false,
            ref_format: RefFormat::A1,
            default_sheet_cols: MAX_COLS,
            default_sheet_rows: MAX_ROWS,
            rand_seed: 0x5eed,
            max_cycle_reports: 64,
        }
    }
}
