//! The seam between cell text and the engine.
//!
//! Parsing is left to the embedding application. A parser turns what the
//! user typed into a [`Cell`], using the workbook to resolve sheet names and
//! the target position to build relative references.

use crate::engine::{Cell, Workbook};

pub trait CellParser {
    /// Parse `text` as typed into (`col`, `row`). `None` means the text is
    /// not valid cell content.
    fn parse_cell_content(&self, text: &str, workbook: &Workbook, col: u32, row: u32) -> Option<Cell>;
}

/// Accepts numbers, `'`-quoted text and plain text; never formulas.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantParser;

impl CellParser for ConstantParser {
    fn parse_cell_content(&self, text: &str, _workbook: &Workbook, _col: u32, _row: u32) -> Option<Cell> {
        if text.is_empty() {
            return Some(Cell::blank());
        }
        if text.starts_with('=') {
            return None;
        }
        if let Some(quoted) = text.strip_prefix('\'') {
            return Some(Cell::quoted_text(quoted));
        }
        Some(match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::number(n),
            _ => Cell::text(text),
        })
    }
}
