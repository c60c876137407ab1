//! Relative/absolute cell references.
//!
//! A reference stores, per axis, either an absolute index or an offset
//! relative to the cell that holds the formula (the *anchor*). The same
//! reference therefore points at different cells depending on where it is
//! evaluated, which is what lets one formula object be shared by a whole
//! block of copied cells.

use std::fmt;

use crate::address::{CellAddress, MAX_COLS, MAX_ROWS, col_to_letters, letters_to_col};

/// How references are rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefFormat {
    #[default]
    A1,
    R1C1,
}

/// One axis of a reference: an absolute index or an offset from the anchor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaRef {
    pub abs: bool,
    pub value: i32,
}

impl RaRef {
    pub const fn absolute(index: u32) -> Self {
        Self {
            abs: true,
            value: index as i32,
        }
    }

    pub const fn relative(offset: i32) -> Self {
        Self {
            abs: false,
            value: offset,
        }
    }

    /// Target index seen from `anchor`, `None` if outside `0..limit`.
    #[inline]
    pub fn resolve(self, anchor: u32, limit: u32) -> Option<u32> {
        let v = if self.abs {
            self.value as i64
        } else {
            anchor as i64 + self.value as i64
        };
        (0..limit as i64).contains(&v).then_some(v as u32)
    }

    /// Relative offsets grow by `delta`; absolute indices are unchanged.
    #[inline]
    pub fn move_by(self, delta: i32) -> Self {
        if self.abs {
            self
        } else {
            Self::relative(self.value + delta)
        }
    }

    /// Re-aim this reference after `count` lines were inserted before `at`.
    ///
    /// `host` is the holder's position before the insertion and `new_host`
    /// its position after. Targets at or beyond `at` move down by `count`.
    pub fn shift_for_insert(self, host: u32, new_host: u32, at: u32, count: u32) -> Self {
        let shift = |t: i64| if t >= at as i64 { t + count as i64 } else { t };
        if self.abs {
            Self::absolute(shift(self.value as i64) as u32)
        } else {
            let target = shift(host as i64 + self.value as i64);
            Self::relative((target - new_host as i64) as i32)
        }
    }
}

/// A column/row reference pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRefSpec {
    pub col: RaRef,
    pub row: RaRef,
}

impl CellRefSpec {
    pub const fn new(col: RaRef, row: RaRef) -> Self {
        Self { col, row }
    }

    /// Fully absolute reference to `target`.
    pub const fn absolute(target: CellAddress) -> Self {
        Self::new(RaRef::absolute(target.col), RaRef::absolute(target.row))
    }

    /// Fully relative reference to `target` as seen from `anchor`.
    pub fn relative(target: CellAddress, anchor: CellAddress) -> Self {
        Self::new(
            RaRef::relative(target.col as i32 - anchor.col as i32),
            RaRef::relative(target.row as i32 - anchor.row as i32),
        )
    }

    pub fn resolve(self, anchor: CellAddress) -> Option<CellAddress> {
        Some(CellAddress::new(
            self.col.resolve(anchor.col, MAX_COLS)?,
            self.row.resolve(anchor.row, MAX_ROWS)?,
        ))
    }

    pub fn move_by(self, dcol: i32, drow: i32) -> Self {
        Self::new(self.col.move_by(dcol), self.row.move_by(drow))
    }

    /// Parse `B7`, `$B$7`, `B$7` or `$B7`; relative parts are measured
    /// from `anchor`.
    pub fn parse_a1(text: &str, anchor: CellAddress) -> Result<Self, RefParseError> {
        let err = || RefParseError::new(text);
        let bytes = text.as_bytes();
        let mut i = 0;
        let col_abs = bytes.first() == Some(&b'$');
        if col_abs {
            i += 1;
        }
        let letters_end = i + bytes[i..]
            .iter()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        let letters = text[i..letters_end].to_ascii_uppercase();
        let col = letters_to_col(&letters).ok_or_else(err)?;
        i = letters_end;
        let row_abs = bytes.get(i) == Some(&b'$');
        if row_abs {
            i += 1;
        }
        let row: u32 = text[i..].parse().map_err(|_| err())?;
        if row == 0 || row > MAX_ROWS || col >= MAX_COLS {
            return Err(err());
        }
        let target = CellAddress::new(col, row - 1);
        let axis = |abs: bool, t: u32, a: u32| {
            if abs {
                RaRef::absolute(t)
            } else {
                RaRef::relative(t as i32 - a as i32)
            }
        };
        Ok(Self::new(
            axis(col_abs, target.col, anchor.col),
            axis(row_abs, target.row, anchor.row),
        ))
    }

    /// Parse `R3C2`, `R[-1]C[2]`, `RC[1]` and mixtures thereof.
    pub fn parse_r1c1(text: &str) -> Result<Self, RefParseError> {
        let err = || RefParseError::new(text);
        let upper = text.to_ascii_uppercase();
        let rest = upper.strip_prefix('R').ok_or_else(err)?;
        let c_at = rest.find('C').ok_or_else(err)?;
        let row = parse_r1c1_axis(&rest[..c_at], MAX_ROWS).ok_or_else(err)?;
        let col = parse_r1c1_axis(&rest[c_at + 1..], MAX_COLS).ok_or_else(err)?;
        Ok(Self::new(col, row))
    }

    /// Render as seen from `anchor`. Unresolvable A1 references render as `#REF!`.
    pub fn show(self, anchor: CellAddress, format: RefFormat) -> String {
        match format {
            RefFormat::R1C1 => {
                let mut out = String::new();
                show_r1c1_axis(&mut out, 'R', self.row);
                show_r1c1_axis(&mut out, 'C', self.col);
                out
            }
            RefFormat::A1 => match self.resolve(anchor) {
                Some(target) => {
                    let mut out = String::new();
                    if self.col.abs {
                        out.push('$');
                    }
                    out.push_str(&col_to_letters(target.col));
                    if self.row.abs {
                        out.push('$');
                    }
                    out.push_str(&(target.row + 1).to_string());
                    out
                }
                None => "#REF!".to_owned(),
            },
        }
    }
}

fn parse_r1c1_axis(part: &str, limit: u32) -> Option<RaRef> {
    if part.is_empty() {
        return Some(RaRef::relative(0));
    }
    if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
        return inner.parse::<i32>().ok().map(RaRef::relative);
    }
    let one_based: u32 = part.parse().ok()?;
    (1..=limit)
        .contains(&one_based)
        .then(|| RaRef::absolute(one_based - 1))
}

fn show_r1c1_axis(out: &mut String, tag: char, r: RaRef) {
    out.push(tag);
    if r.abs {
        out.push_str(&(r.value + 1).to_string());
    } else if r.value != 0 {
        out.push_str(&format!("[{}]", r.value));
    }
}

/// A reference string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefParseError {
    pub text: String,
}

impl RefParseError {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
        }
    }
}

impl fmt::Display for RefParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell reference `{}`", self.text)
    }
}

impl std::error::Error for RefParseError {}
