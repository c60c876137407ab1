//! Formula evaluation over sparse tiled sheets.
//!
//! A [`Workbook`](engine::Workbook) holds sheets of [`Cell`](engine::Cell)s.
//! Formulas are [`Expr`](expr::Expr) trees built by an external parser (see
//! [`parse::CellParser`]); the engine tracks which cells read which through
//! support sets and recalculates incrementally.

#[macro_use]
mod macros;

pub mod builtins;
pub mod engine;
pub mod expr;
pub mod function;
pub mod function_registry;
pub mod parse;
pub mod traits;
pub mod value;

#[cfg(test)]
mod test_utils;

pub use engine::{Cell, EngineError, EvalConfig, RecalcReport, Workbook};
pub use expr::Expr;
pub use parse::CellParser;
pub use value::{ArrayValue, Value};

pub use tilecalc_common::{
    CellAddress, CellRefSpec, ErrorKind, ErrorValue, FullCellAddress, Interval, RaRef, RefFormat, SheetId,
};
