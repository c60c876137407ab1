use tilecalc_common::FullCellAddress;

use super::common::n;
use crate::engine::{Cell, EvalConfig, Workbook};
use crate::expr::Expr;
use crate::test_utils::{a1, abs, area, num, rel, set_formula, set_number, value};

fn at(s: &str) -> FullCellAddress {
    let a = a1(s);
    FullCellAddress::new(0, a.col, a.row)
}

fn supported(wb: &Workbook, s: &str) -> Vec<FullCellAddress> {
    let a = a1(s);
    let mut out = wb
        .cell(0, a.col, a.row)
        .map(|c| wb.supported_cells(c))
        .unwrap_or_default();
    out.sort();
    out
}

#[test]
fn test_area_reference_registers_every_cell() {
    let mut wb = Workbook::new();
    set_formula(&mut wb, 0, "D1", Expr::call("SUM", vec![area("A1", "B3", "D1")]));
    for s in ["A1", "A2", "A3", "B1", "B2", "B3"] {
        assert_eq!(supported(&wb, s), vec![at("D1")], "{s}");
    }
    assert!(supported(&wb, "C1").is_empty());
}

#[test]
fn test_repeated_references_register_once() {
    let mut wb = Workbook::new();
    set_formula(&mut wb, 0, "B1", Expr::binary("+", rel("A1", "B1"), rel("A1", "B1")));
    let a = a1("A1");
    let holder = wb.cell(0, a.col, a.row).unwrap();
    assert_eq!(holder.support().as_ref().unwrap().ranges().len(), 1);
}

#[test]
fn test_removing_one_member_splits_the_area() {
    let mut wb = Workbook::new();
    set_number(&mut wb, 0, "A1", 1.0);
    let src = Cell::formula(Expr::binary("*", abs("A1"), num(2.0)));
    wb.paste_cell(0, &src, 1, 0, 1, 10).unwrap();
    set_number(&mut wb, 0, "B5", 0.0);

    let a = a1("A1");
    let holder = wb.cell(0, a.col, a.row).unwrap();
    {
        let support = holder.support();
        let set = support.as_ref().unwrap();
        assert_eq!(set.ranges().len(), 2);
        assert_eq!(set.count(), 9);
    }
    assert!(!supported(&wb, "A1").contains(&at("B5")));
}

#[test]
fn test_block_of_relative_formulas_supports_per_row() {
    let mut wb = Workbook::new();
    // B1:B4 = A1 + A2 relative, i.e. each reads its own row and the next.
    let src = Cell::formula(Expr::binary("+", rel("A1", "B1"), rel("A2", "B1")));
    wb.paste_cell(0, &src, 1, 0, 1, 4).unwrap();
    assert_eq!(supported(&wb, "A1"), vec![at("B1")]);
    assert_eq!(supported(&wb, "A3"), vec![at("B2"), at("B3")]);
    assert_eq!(supported(&wb, "A5"), vec![at("B4")]);
}

#[test]
fn test_cross_sheet_references() {
    let mut wb = Workbook::new();
    let data = wb.add_sheet("Data 2024").unwrap();
    wb.set_cell(data, 0, 0, Some(Cell::number(4.0))).unwrap();
    let spec = tilecalc_common::CellRefSpec::absolute(a1("A1"));
    set_formula(&mut wb, 0, "A1", Expr::binary("*", Expr::sheet_cell(data, spec), num(3.0)));
    assert_eq!(super::common::show(&wb, 0, "A1"), "='Data 2024'!$A$1*3");
    wb.recalculate();
    assert_eq!(value(&wb, 0, "A1"), n(12.0));

    wb.set_cell(data, 0, 0, Some(Cell::number(5.0))).unwrap();
    wb.recalculate();
    assert_eq!(value(&wb, 0, "A1"), n(15.0));
}

fn overlapping_sums(idempotent: bool) -> Workbook {
    let mut wb = Workbook::with_config(EvalConfig {
        idempotent_support_visits: idempotent,
        ..EvalConfig::default()
    });
    set_number(&mut wb, 0, "A1", 1.0);
    set_number(&mut wb, 0, "A2", 2.0);
    set_number(&mut wb, 0, "A3", 3.0);
    let src = Cell::formula(Expr::call(
        "SUM",
        vec![Expr::area(
            tilecalc_common::CellRefSpec::absolute(a1("A1")),
            tilecalc_common::CellRefSpec::absolute(a1("A3")),
        )],
    ));
    wb.paste_cell(0, &src, 1, 0, 1, 10).unwrap();
    wb.recalculate();
    wb
}

#[test]
fn test_idempotent_visits_give_the_same_results() {
    for idempotent in [false, true] {
        let mut wb = overlapping_sums(idempotent);
        assert_eq!(value(&wb, 0, "B10"), n(6.0));
        set_number(&mut wb, 0, "A1", 10.0);
        set_number(&mut wb, 0, "A2", 20.0);
        let report = wb.recalculate();
        assert_eq!(report.cells_evaluated, 10, "idempotent = {idempotent}");
        for row in 0..10 {
            assert_eq!(wb.eval_cell(0, 1, row), n(33.0));
        }
    }
}
