use std::rc::Rc;

use tilecalc_common::{CellRefSpec, FullCellAddress};

use super::common::{addr, n, show};
use crate::engine::{Cell, EngineError, Workbook};
use crate::expr::Expr;
use crate::test_utils::{a1, abs, area, num, rel, set_formula, set_number, value};

#[test]
fn test_insert_rows_shifts_cells_and_references() {
    let mut wb = Workbook::new();
    set_number(&mut wb, 0, "A1", 1.0);
    set_number(&mut wb, 0, "A2", 2.0);
    set_formula(&mut wb, 0, "A3", Expr::call("SUM", vec![area("A1", "A2", "A3")]));
    set_formula(&mut wb, 0, "B1", abs("A2"));
    wb.recalculate();

    // One row before row 2.
    let report = wb.insert_row_cols(0, 1, 1, true).unwrap();
    assert!(report.full);
    assert_eq!(value(&wb, 0, "A3"), n(2.0));
    assert_eq!(show(&wb, 0, "A4"), "=SUM(A1:A3)");
    assert_eq!(show(&wb, 0, "B1"), "=$A$3");
    assert_eq!(value(&wb, 0, "A4"), n(3.0));
    assert_eq!(value(&wb, 0, "B1"), n(2.0));

    // Support sets follow the move.
    set_number(&mut wb, 0, "A3", 10.0);
    wb.recalculate();
    assert_eq!(value(&wb, 0, "A4"), n(11.0));
    assert_eq!(value(&wb, 0, "B1"), n(10.0));
}

#[test]
fn test_insert_columns() {
    let mut wb = Workbook::new();
    set_number(&mut wb, 0, "A1", 5.0);
    set_formula(&mut wb, 0, "C1", Expr::binary("*", rel("A1", "C1"), num(2.0)));
    wb.recalculate();

    wb.insert_row_cols(0, 1, 2, false).unwrap();
    assert_eq!(show(&wb, 0, "E1"), "=A1*2");
    assert_eq!(value(&wb, 0, "E1"), n(10.0));
    assert!(wb.cell(0, 2, 0).is_none());
}

#[test]
fn test_insert_keeps_shared_formulas_shared() {
    let mut wb = Workbook::new();
    for row in 0..10 {
        wb.set_cell(0, 0, row, Some(Cell::number(row as f64))).unwrap();
    }
    let src = Cell::formula(Expr::binary("*", rel("A1", "B1"), num(2.0)));
    wb.paste_cell(0, &src, 1, 0, 1, 10).unwrap();
    wb.recalculate();

    wb.insert_row_cols(0, 5, 2, true).unwrap();
    assert_eq!(value(&wb, 0, "B5"), n(8.0));
    assert!(wb.cell(0, 1, 5).is_none());
    assert_eq!(value(&wb, 0, "B8"), n(10.0));
    assert_eq!(value(&wb, 0, "B12"), n(18.0));
    assert_eq!(show(&wb, 0, "B12"), "=A12*2");

    let first = Rc::clone(wb.cell(0, 1, 0).unwrap().formula_expr().unwrap());
    for row in (0..5).chain(7..12) {
        assert!(Rc::ptr_eq(&first, wb.cell(0, 1, row).unwrap().formula_expr().unwrap()));
    }
}

#[test]
fn test_area_spanning_the_insertion_grows() {
    let mut wb = Workbook::new();
    let src = Cell::formula(Expr::call("SUM", vec![area("A1", "A4", "B1")]));
    wb.set_cell(0, 1, 0, Some(src)).unwrap();
    wb.insert_row_cols(0, 2, 3, true).unwrap();
    assert_eq!(show(&wb, 0, "B1"), "=SUM(A1:A7)");
}

#[test]
fn test_insert_rewrites_other_sheets() {
    let mut wb = Workbook::new();
    let other = wb.add_sheet("Sheet2").unwrap();
    set_number(&mut wb, 0, "A2", 7.0);
    let spec = CellRefSpec::relative(a1("A2"), a1("A1"));
    wb.set_cell(other, 0, 0, Some(Cell::formula(Expr::sheet_cell(0, spec)))).unwrap();
    wb.recalculate();

    wb.insert_row_cols(0, 0, 1, true).unwrap();
    assert_eq!(wb.show(other, 0, 0), "=Sheet1!A3");
    assert_eq!(wb.eval_cell(other, 0, 0), n(7.0));
    // Nothing moved on the other sheet.
    assert!(wb.cell(other, 0, 1).is_none());
}

#[test]
fn test_insert_moves_array_formulas_whole() {
    let mut wb = Workbook::new();
    wb.set_array_formula(0, num(3.0), addr("C2"), addr("C3")).unwrap();
    wb.insert_row_cols(0, 0, 2, true).unwrap();
    assert_eq!(value(&wb, 0, "C4"), n(3.0));
    assert_eq!(value(&wb, 0, "C5"), n(3.0));
    let caf = Rc::clone(wb.cell(0, 2, 3).unwrap().array_slot_ref().unwrap().caf());
    assert_eq!(caf.ul(), addr("C4"));
    assert!(Rc::ptr_eq(&caf, wb.cell(0, 2, 4).unwrap().array_slot_ref().unwrap().caf()));
}

#[test]
fn test_insert_refuses_to_split_array_formulas() {
    let mut wb = Workbook::new();
    wb.set_array_formula(0, num(1.0), addr("A1"), addr("A3")).unwrap();
    let err = wb.insert_row_cols(0, 1, 1, true).unwrap_err();
    assert_eq!(
        err,
        EngineError::WouldSplitArrayFormula {
            at: 1,
            anchor: FullCellAddress::new(0, 0, 0)
        }
    );
    // Inserting columns beside it is fine.
    wb.insert_row_cols(0, 1, 1, false).unwrap();
}

#[test]
fn test_insert_refuses_to_push_cells_off_the_sheet() {
    let mut wb = Workbook::new();
    let small = wb.add_sheet_sized("Small", 4, 10).unwrap();
    wb.set_cell(small, 0, 9, Some(Cell::number(1.0))).unwrap();
    let err = wb.insert_row_cols(small, 5, 1, true).unwrap_err();
    assert!(matches!(err, EngineError::InsertOverflow { count: 1, .. }));
    assert_eq!(wb.eval_cell(small, 0, 9), n(1.0));
    assert!(wb.insert_row_cols(small, 0, 1, false).is_ok());
}
