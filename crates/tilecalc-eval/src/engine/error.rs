use thiserror::Error;
use tilecalc_common::{FullCellAddress, SheetId};

/// Failures reported by workbook edits.
///
/// Evaluation problems never surface here; they become error values in
/// the cells concerned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown sheet id {0}")]
    UnknownSheet(SheetId),

    #[error("`{0}` is not a valid sheet name")]
    InvalidSheetName(String),

    #[error("a sheet named `{0}` already exists")]
    DuplicateSheetName(String),

    #[error("cell ({col}, {row}) lies outside sheet `{sheet}`")]
    OutOfBounds { sheet: String, col: u32, row: u32 },

    #[error("cell {0} is part of an array formula")]
    PartOfArrayFormula(FullCellAddress),

    #[error("inserting at index {at} would split the array formula anchored at {anchor}")]
    WouldSplitArrayFormula { at: u32, anchor: FullCellAddress },

    #[error("inserting {count} rows or columns would push cells off sheet `{sheet}`")]
    InsertOverflow { sheet: String, count: u32 },
}
