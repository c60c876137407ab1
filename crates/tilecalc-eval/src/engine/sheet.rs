use std::rc::Rc;

use tilecalc_common::{CellAddress, SheetId};

use super::cell::Cell;
use super::grid::SheetRep;
use super::workbook::Workbook;

/// A named grid of cells. All mutation goes through the owning
/// [`Workbook`](super::Workbook) so support sets stay consistent.
#[derive(Debug)]
pub struct Sheet {
    id: SheetId,
    name: String,
    cols: u32,
    rows: u32,
    cells: SheetRep<Rc<Cell>>,
}

impl Sheet {
    pub(crate) fn new(id: SheetId, name: &str, cols: u32, rows: u32) -> Self {
        Sheet {
            id,
            name: name.to_string(),
            cols,
            rows,
            cells: SheetRep::new(),
        }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn in_bounds(&self, col: u32, row: u32) -> bool {
        col < self.cols && row < self.rows
    }

    pub fn get(&self, col: u32, row: u32) -> Option<&Rc<Cell>> {
        self.cells.get(col, row)
    }

    /// Occupied cells, including blank support holders.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &Rc<Cell>)> + '_ {
        self.cells.iter()
    }

    /// Non-blank cells in row-major order.
    pub fn iter_for_export(&self) -> impl Iterator<Item = (CellAddress, &Rc<Cell>)> + '_ {
        self.cells.iter_for_export().filter(|(_, c)| !c.is_blank())
    }

    /// Non-blank cells with their typed form, row-major, for persistence.
    pub fn cells_for_export<'a>(&'a self, wb: &'a Workbook) -> impl Iterator<Item = (CellAddress, String)> + 'a {
        let format = wb.config().ref_format;
        self.iter_for_export()
            .map(move |(at, cell)| (at, cell.show(wb, self.id, at.col, at.row, format)))
    }

    /// Smallest rectangle holding every non-blank cell.
    pub fn used_range(&self) -> Option<(CellAddress, CellAddress)> {
        let mut bounds: Option<(CellAddress, CellAddress)> = None;
        for (at, cell) in self.cells.iter() {
            if cell.is_blank() {
                continue;
            }
            bounds = Some(match bounds {
                None => (at, at),
                Some((ul, lr)) => (
                    CellAddress::new(ul.col.min(at.col), ul.row.min(at.row)),
                    CellAddress::new(lr.col.max(at.col), lr.row.max(at.row)),
                ),
            });
        }
        bounds
    }

    pub(crate) fn put(&mut self, col: u32, row: u32, cell: Option<Rc<Cell>>) -> Option<Rc<Cell>> {
        self.cells.set(col, row, cell)
    }

    pub(crate) fn take_cells(&mut self) -> SheetRep<Rc<Cell>> {
        std::mem::take(&mut self.cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_range_ignores_blank_holders() {
        let mut sheet = Sheet::new(0, "S", 100, 100);
        assert_eq!(sheet.used_range(), None);
        sheet.put(5, 5, Some(Rc::new(Cell::blank())));
        sheet.put(2, 7, Some(Rc::new(Cell::number(1.0))));
        sheet.put(4, 3, Some(Rc::new(Cell::text("x"))));
        assert_eq!(
            sheet.used_range(),
            Some((CellAddress::new(2, 3), CellAddress::new(4, 7)))
        );
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.iter_for_export().count(), 2);
    }
}
