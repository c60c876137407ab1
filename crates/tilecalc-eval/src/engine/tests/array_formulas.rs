use tilecalc_common::{ErrorValue, FullCellAddress};

use super::common::{addr, n, show};
use crate::engine::{Cell, EngineError, Workbook};
use crate::expr::Expr;
use crate::test_utils::{area, num, rel, set_formula, set_number, value};
use crate::value::Value;

/// Data 1..9 in A1:A9, bins 2 and 4 in B1:B2.
fn frequency_sheet() -> Workbook {
    let mut wb = Workbook::new();
    for row in 0..9 {
        wb.set_cell(0, 0, row, Some(Cell::number(row as f64 + 1.0))).unwrap();
    }
    set_number(&mut wb, 0, "B1", 2.0);
    set_number(&mut wb, 0, "B2", 4.0);
    wb
}

fn frequency_at(anchor: &str) -> std::rc::Rc<Expr> {
    Expr::call(
        "FREQUENCY",
        vec![area("A1", "A9", anchor), area("B1", "B2", anchor)],
    )
}

#[test]
fn test_frequency_fills_its_rectangle() {
    let mut wb = frequency_sheet();
    wb.set_array_formula(0, frequency_at("C1"), addr("C1"), addr("C3")).unwrap();
    wb.recalculate();
    assert_eq!(value(&wb, 0, "C1"), n(2.0));
    assert_eq!(value(&wb, 0, "C2"), n(2.0));
    assert_eq!(value(&wb, 0, "C3"), n(5.0));
    assert_eq!(show(&wb, 0, "C2"), "{=FREQUENCY(A1:A9,B1:B2)}");
}

#[test]
fn test_array_formula_recomputes_on_input_change() {
    let mut wb = frequency_sheet();
    wb.set_array_formula(0, frequency_at("C1"), addr("C1"), addr("C3")).unwrap();
    // G1 reads one slot of the array.
    set_formula(&mut wb, 0, "G1", Expr::binary("*", rel("C3", "G1"), num(10.0)));
    wb.recalculate();
    assert_eq!(value(&wb, 0, "G1"), n(50.0));

    set_number(&mut wb, 0, "A9", 1.0);
    wb.recalculate();
    assert_eq!(value(&wb, 0, "C1"), n(3.0));
    assert_eq!(value(&wb, 0, "C3"), n(4.0));
    assert_eq!(value(&wb, 0, "G1"), n(40.0));
}

#[test]
fn test_slots_beyond_the_result_read_na() {
    let mut wb = frequency_sheet();
    wb.set_array_formula(0, frequency_at("D1"), addr("D1"), addr("D5")).unwrap();
    wb.recalculate();
    assert_eq!(value(&wb, 0, "D3"), n(5.0));
    assert_eq!(value(&wb, 0, "D4"), Value::Error(ErrorValue::NA));
    assert_eq!(value(&wb, 0, "D5"), Value::Error(ErrorValue::NA));
}

#[test]
fn test_scalar_result_fills_every_slot() {
    let mut wb = Workbook::new();
    wb.set_array_formula(0, num(7.0), addr("E1"), addr("F2")).unwrap();
    wb.recalculate();
    for at in ["E1", "F1", "E2", "F2"] {
        assert_eq!(value(&wb, 0, at), n(7.0));
    }
}

#[test]
fn test_corners_are_normalized() {
    let mut wb = Workbook::new();
    wb.set_array_formula(0, num(1.0), addr("F2"), addr("E1")).unwrap();
    let slot = wb.cell(0, 4, 0).unwrap();
    let caf = slot.array_slot_ref().unwrap().caf();
    assert_eq!(caf.ul(), addr("E1"));
    assert_eq!(caf.lr(), addr("F2"));
}

#[test]
fn test_slots_cannot_be_edited_individually() {
    let mut wb = frequency_sheet();
    wb.set_array_formula(0, frequency_at("C1"), addr("C1"), addr("C3")).unwrap();
    let err = wb.set_cell(0, 2, 1, Some(Cell::number(1.0))).unwrap_err();
    assert_eq!(err, EngineError::PartOfArrayFormula(FullCellAddress::new(0, 2, 1)));
    let err = wb
        .set_array_formula(0, num(0.0), addr("C3"), addr("C4"))
        .unwrap_err();
    assert!(matches!(err, EngineError::PartOfArrayFormula(_)));
}

#[test]
fn test_remove_array_formula_clears_the_rectangle() {
    let mut wb = frequency_sheet();
    wb.set_array_formula(0, frequency_at("C1"), addr("C1"), addr("C3")).unwrap();
    wb.recalculate();
    assert!(wb.remove_array_formula(0, 2, 1).unwrap());
    assert!(wb.cell(0, 2, 0).is_none());
    assert!(wb.cell(0, 2, 2).is_none());
    assert!(!wb.remove_array_formula(0, 2, 1).unwrap());
    // Inputs no longer support the removed formula.
    assert!(!wb.cell(0, 0, 0).unwrap().has_support());
}

#[test]
fn test_only_the_anchor_registers_support() {
    let mut wb = frequency_sheet();
    wb.set_array_formula(0, frequency_at("C1"), addr("C1"), addr("C3")).unwrap();
    let input = wb.cell(0, 0, 4).unwrap();
    assert_eq!(wb.supported_cells(input), vec![FullCellAddress::new(0, 2, 0)]);
}
