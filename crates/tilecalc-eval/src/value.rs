//! Runtime values produced by evaluation.

use std::{fmt, rc::Rc};

use tilecalc_common::{CellAddress, ErrorValue, SheetId};

use crate::engine::Workbook;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(Rc<str>),
    Error(ErrorValue),
    Array(ArrayValue),
}

impl Value {
    pub fn text(s: &str) -> Self {
        Value::Text(Rc::from(s))
    }

    pub fn from_bool(b: bool) -> Self {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Coerce to a number the way arithmetic operators do.
    ///
    /// Empty reads as zero, numeric text is parsed, a 1×1 array yields its
    /// element. Errors pass through unchanged.
    pub fn to_number(&self, wb: &Workbook) -> Result<f64, ErrorValue> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Empty => Ok(0.0),
            Value::Text(s) => s.trim().parse::<f64>().map_err(|_| ErrorValue::VALUE),
            Value::Error(e) => Err(*e),
            Value::Array(a) if a.cols() == 1 && a.rows() == 1 => a.get(wb, 0, 0).to_number(wb),
            Value::Array(_) => Err(ErrorValue::VALUE),
        }
    }

    /// Truth value used by conditionals: non-zero numbers are true.
    pub fn to_bool(&self, wb: &Workbook) -> Result<bool, ErrorValue> {
        match self {
            Value::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
            Value::Text(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
            other => other.to_number(wb).map(|n| n != 0.0),
        }
    }

    /// Text form used by `&`.
    pub fn to_text(&self, wb: &Workbook) -> Result<Rc<str>, ErrorValue> {
        match self {
            Value::Text(s) => Ok(s.clone()),
            Value::Empty => Ok(Rc::from("")),
            Value::Number(n) => Ok(Rc::from(format_number(*n))),
            Value::Error(e) => Err(*e),
            Value::Array(a) if a.cols() == 1 && a.rows() == 1 => a.get(wb, 0, 0).to_text(wb),
            Value::Array(_) => Err(ErrorValue::VALUE),
        }
    }

    /// Resolve lazy area views so the value no longer reads the workbook.
    pub fn materialize(&self, wb: &Workbook) -> Value {
        match self {
            Value::Array(a @ ArrayValue::View(_)) => Value::Array(ArrayValue::Explicit(a.to_explicit(wb))),
            other => other.clone(),
        }
    }

    /// Render for display. Arrays show as `{a, b; c, d}`.
    pub fn show(&self, wb: &Workbook) -> String {
        match self {
            Value::Array(a) => {
                let mut out = String::from("{");
                for r in 0..a.rows() {
                    if r > 0 {
                        out.push_str("; ");
                    }
                    for c in 0..a.cols() {
                        if c > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&a.get(wb, c, r).show(wb));
                    }
                }
                out.push('}');
                out
            }
            other => other.to_string(),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::Error(e)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}

/// Displays scalars. Arrays need the workbook (see [`Value::show`]) and
/// render here only as their shape.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Error(e) => write!(f, "{e}"),
            Value::Array(a) => write!(f, "{{{}x{}}}", a.cols(), a.rows()),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/* ───────────────────────────── Arrays ───────────────────────────── */

/// A two-dimensional value.
///
/// `View` is a lazy window onto a sheet area: elements are read from the
/// workbook on demand, so a large area passed to `SUM` is never copied.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Explicit(ExplicitArray),
    View(AreaView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitArray {
    cols: u32,
    rows: u32,
    /// Row-major.
    values: Rc<[Value]>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AreaView {
    pub sheet: SheetId,
    pub ul: CellAddress,
    pub cols: u32,
    pub rows: u32,
}

impl ExplicitArray {
    /// Panics unless `values.len() == cols * rows` and both are non-zero.
    pub fn new(cols: u32, rows: u32, values: Vec<Value>) -> Self {
        assert!(cols > 0 && rows > 0, "arrays have at least one element");
        assert_eq!(values.len(), (cols * rows) as usize, "array shape mismatch");
        Self {
            cols,
            rows,
            values: values.into(),
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl ArrayValue {
    pub fn new(cols: u32, rows: u32, values: Vec<Value>) -> Self {
        ArrayValue::Explicit(ExplicitArray::new(cols, rows, values))
    }

    /// A single-column array.
    pub fn column(values: Vec<Value>) -> Self {
        Self::new(1, values.len() as u32, values)
    }

    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        Self::new(width, height, rows.into_iter().flatten().collect())
    }

    pub fn view(sheet: SheetId, ul: CellAddress, cols: u32, rows: u32) -> Self {
        ArrayValue::View(AreaView { sheet, ul, cols, rows })
    }

    pub fn cols(&self) -> u32 {
        match self {
            ArrayValue::Explicit(a) => a.cols,
            ArrayValue::View(v) => v.cols,
        }
    }

    pub fn rows(&self) -> u32 {
        match self {
            ArrayValue::Explicit(a) => a.rows,
            ArrayValue::View(v) => v.rows,
        }
    }

    /// Element at (`col`, `row`); outside the array yields `#N/A`.
    pub fn get(&self, wb: &Workbook, col: u32, row: u32) -> Value {
        if col >= self.cols() || row >= self.rows() {
            return Value::Error(ErrorValue::NA);
        }
        match self {
            ArrayValue::Explicit(a) => a.values[(row * a.cols + col) as usize].clone(),
            ArrayValue::View(v) => wb.eval_cell(v.sheet, v.ul.col + col, v.ul.row + row),
        }
    }

    /// Elements in row-major order.
    pub fn iter<'w>(&'w self, wb: &'w Workbook) -> impl Iterator<Item = Value> + 'w {
        let cols = self.cols();
        (0..self.rows()).flat_map(move |r| (0..cols).map(move |c| self.get(wb, c, r)))
    }

    pub fn to_explicit(&self, wb: &Workbook) -> ExplicitArray {
        match self {
            ArrayValue::Explicit(a) => a.clone(),
            ArrayValue::View(_) => ExplicitArray::new(self.cols(), self.rows(), self.iter(wb).collect()),
        }
    }

    /// Apply `f` to every numeric element. Errors stay in place and any
    /// other non-numeric element becomes `#VALUE!`.
    pub fn map_numeric(&self, wb: &Workbook, f: impl Fn(f64) -> Value) -> ArrayValue {
        self.map_values(wb, |v| match v.to_number(wb) {
            Ok(n) => f(n),
            Err(e) => Value::Error(e),
        })
    }

    /// Apply `f` to every element, whatever its kind.
    pub fn map_values(&self, wb: &Workbook, mut f: impl FnMut(Value) -> Value) -> ArrayValue {
        let values = self.iter(wb).map(&mut f).collect();
        ArrayValue::new(self.cols(), self.rows(), values)
    }
}
