use std::time::Duration;

use tilecalc_common::FullCellAddress;

/// Outcome of one recalculation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalcReport {
    /// Workbook-wide pass counter after this pass.
    pub recalc_count: u64,
    /// Cells evaluated by the pass itself. Cells pulled in recursively by
    /// those evaluations are not counted.
    pub cells_evaluated: usize,
    /// Cells found evaluating themselves, in discovery order.
    pub cycle_culprits: Vec<FullCellAddress>,
    /// True for full recalculations.
    pub full: bool,
    pub elapsed: Duration,
}

impl RecalcReport {
    pub fn had_cycles(&self) -> bool {
        !self.cycle_culprits.is_empty()
    }

    /// One-line human summary, e.g. for a status bar.
    pub fn summary(&self) -> String {
        let kind = if self.full { "full" } else { "incremental" };
        let mut s = format!(
            "{kind} recalc #{}: {} cells in {:.1}ms",
            self.recalc_count,
            self.cells_evaluated,
            self.elapsed.as_secs_f64() * 1000.0
        );
        if let Some(first) = self.cycle_culprits.first() {
            s.push_str(&format!(
                ", {} cycle(s) first at {first}",
                self.cycle_culprits.len()
            ));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_cycles() {
        let report = RecalcReport {
            recalc_count: 3,
            cells_evaluated: 2,
            cycle_culprits: vec![FullCellAddress::new(0, 0, 0)],
            full: false,
            elapsed: Duration::from_millis(2),
        };
        let s = report.summary();
        assert!(s.starts_with("incremental recalc #3: 2 cells"));
        assert!(s.contains("1 cycle(s) first at #0!A1"));
    }
}
