//! Cell addresses.
//!
//! Columns and rows are zero-based. `CellAddress` is a position inside one
//! sheet; `FullCellAddress` pairs it with the owning sheet's id.

use std::fmt;

/// Index of a sheet inside its workbook.
pub type SheetId = u16;

/// Number of addressable columns in a sheet (A..XFD-style range of 2^16).
pub const MAX_COLS: u32 = 1 << 16;
/// Number of addressable rows in a sheet.
pub const MAX_ROWS: u32 = 1 << 20;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    pub fn is_valid(self) -> bool {
        self.col < MAX_COLS && self.row < MAX_ROWS
    }

    /// Shift by a signed delta, `None` if the result leaves the sheet.
    pub fn offset(self, dcol: i64, drow: i64) -> Option<Self> {
        let col = self.col as i64 + dcol;
        let row = self.row as i64 + drow;
        if (0..MAX_COLS as i64).contains(&col) && (0..MAX_ROWS as i64).contains(&row) {
            Some(Self::new(col as u32, row as u32))
        } else {
            None
        }
    }

    /// Parse a plain `A1`-style address (no `$` markers).
    pub fn parse_a1(s: &str) -> Option<Self> {
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = s.split_at(split);
        let col = letters_to_col(&letters.to_ascii_uppercase())?;
        let row: u32 = digits.parse().ok()?;
        let addr = Self::new(col, row.checked_sub(1)?);
        addr.is_valid().then_some(addr)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Debug for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A cell address qualified by its sheet.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FullCellAddress {
    pub sheet: SheetId,
    pub addr: CellAddress,
}

impl FullCellAddress {
    pub const fn new(sheet: SheetId, col: u32, row: u32) -> Self {
        Self {
            sheet,
            addr: CellAddress::new(col, row),
        }
    }

    #[inline]
    pub fn col(self) -> u32 {
        self.addr.col
    }

    #[inline]
    pub fn row(self) -> u32 {
        self.addr.row
    }
}

impl fmt::Display for FullCellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}!{}", self.sheet, self.addr)
    }
}

impl fmt::Debug for FullCellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Zero-based column index to letters: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn col_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        buf.push(b'A' + (col % 26) as u8);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Upper-case letters to a zero-based column index.
pub fn letters_to_col(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add((ch - b'A') as u32)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn column_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
        assert_eq!(letters_to_col("AB"), Some(27));
        assert_eq!(letters_to_col("a"), None);
    }

    #[test]
    fn a1_parsing_and_display() {
        let c2 = CellAddress::parse_a1("C2").unwrap();
        assert_eq!(c2, CellAddress::new(2, 1));
        assert_eq!(c2.to_string(), "C2");
        assert_eq!(CellAddress::parse_a1("A0"), None);
        assert_eq!(CellAddress::parse_a1("12"), None);
    }

    #[test]
    fn offset_stays_inside_sheet() {
        let a1 = CellAddress::new(0, 0);
        assert_eq!(a1.offset(-1, 0), None);
        assert_eq!(a1.offset(2, 3), Some(CellAddress::new(2, 3)));
        assert_eq!(CellAddress::new(0, MAX_ROWS - 1).offset(0, 1), None);
    }

    proptest! {
        #[test]
        fn letters_round_trip(col in 0u32..MAX_COLS) {
            prop_assert_eq!(letters_to_col(&col_to_letters(col)), Some(col));
        }
    }
}
