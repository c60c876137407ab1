//! Meta crate that re-exports the tilecalc building blocks with sensible
//! defaults. Depend on this crate and opt into layers via feature flags, or
//! reach the underlying crates directly for deeper integration.
//!
//! ```
//! use tilecalc::eval::{Cell, Expr, Value, Workbook};
//!
//! let mut wb = Workbook::new();
//! wb.set_cell(0, 0, 0, Some(Cell::number(4.0))).unwrap();
//! let a1 = tilecalc::CellRefSpec::absolute(tilecalc::CellAddress::new(0, 0));
//! let doubled = Expr::binary("*", Expr::cell(a1), Expr::number(2.0));
//! wb.set_cell(0, 1, 0, Some(Cell::formula(doubled))).unwrap();
//! wb.recalculate();
//! assert_eq!(wb.eval_cell(0, 1, 0), Value::Number(8.0));
//! ```

#[cfg(feature = "common")]
pub use tilecalc_common as common;

#[cfg(feature = "eval")]
pub use tilecalc_eval as eval;

#[cfg(feature = "common")]
pub use tilecalc_common::{
    CellAddress, CellRefSpec, ErrorKind, ErrorValue, FullCellAddress, Interval, RaRef, RefFormat, SheetId,
};

#[cfg(feature = "eval")]
pub use tilecalc_eval::{CellParser, EvalConfig, RecalcReport, Value, Workbook};
