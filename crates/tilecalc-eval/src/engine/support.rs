//! Support sets: for a referenced cell, the cells whose formulas read it.
//!
//! Ranges are kept compact. A block of copied formulas reading one cell is
//! a single area entry, and removing one member splits the area into at
//! most four pieces.

use smallvec::SmallVec;
use tilecalc_common::{FullCellAddress, Interval, SheetId};

/// A rectangle of supported cells on one sheet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SupportArea {
    pub sheet: SheetId,
    pub cols: Interval,
    pub rows: Interval,
}

impl SupportArea {
    pub fn count(&self) -> usize {
        self.cols.len() * self.rows.len()
    }

    pub fn contains(&self, at: FullCellAddress) -> bool {
        self.sheet == at.sheet && self.cols.contains(at.col()) && self.rows.contains(at.row())
    }

    pub fn overlaps(&self, other: &SupportArea) -> bool {
        self.sheet == other.sheet && self.cols.overlaps(other.cols) && self.rows.overlaps(other.rows)
    }

    /// Panics unless the two overlap.
    pub fn intersect(&self, other: &SupportArea) -> SupportArea {
        SupportArea {
            sheet: self.sheet,
            cols: self.cols.intersect(other.cols),
            rows: self.rows.intersect(other.rows),
        }
    }

    pub fn contains_area(&self, other: &SupportArea) -> bool {
        self.sheet == other.sheet
            && self.cols.contains_interval(other.cols)
            && self.rows.contains_interval(other.rows)
    }

    pub fn for_each(&self, mut act: impl FnMut(FullCellAddress)) {
        for c in self.cols {
            for r in self.rows {
                act(FullCellAddress::new(self.sheet, c, r));
            }
        }
    }
}

/// One entry of a support set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SupportRange {
    Cell(FullCellAddress),
    Area(SupportArea),
}

impl SupportRange {
    /// A cell entry when the rectangle is 1×1, an area entry otherwise.
    pub fn make(sheet: SheetId, cols: Interval, rows: Interval) -> Self {
        if cols.is_point() && rows.is_point() {
            SupportRange::Cell(FullCellAddress::new(sheet, cols.min(), rows.min()))
        } else {
            SupportRange::Area(SupportArea { sheet, cols, rows })
        }
    }

    pub fn contains(&self, at: FullCellAddress) -> bool {
        match self {
            SupportRange::Cell(c) => *c == at,
            SupportRange::Area(a) => a.contains(at),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            SupportRange::Cell(_) => 1,
            SupportRange::Area(a) => a.count(),
        }
    }

    /// Remove `at` from this range, leaving the rest as at most four
    /// pieces: the target column above and below it, and the full-height
    /// strips left and right of the target column.
    pub fn split_around(&self, at: FullCellAddress) -> SmallVec<[SupportRange; 4]> {
        let mut out = SmallVec::new();
        match self {
            SupportRange::Cell(c) if *c == at => {}
            SupportRange::Cell(_) => out.push(*self),
            SupportRange::Area(a) if !a.contains(at) => out.push(*self),
            SupportRange::Area(a) => {
                let (c, r) = (at.col(), at.row());
                if r > a.rows.min() {
                    out.push(Self::make(a.sheet, Interval::point(c), Interval::new(a.rows.min(), r - 1)));
                }
                if r < a.rows.max() {
                    out.push(Self::make(a.sheet, Interval::point(c), Interval::new(r + 1, a.rows.max())));
                }
                if c > a.cols.min() {
                    out.push(Self::make(a.sheet, Interval::new(a.cols.min(), c - 1), a.rows));
                }
                if c < a.cols.max() {
                    out.push(Self::make(a.sheet, Interval::new(c + 1, a.cols.max()), a.rows));
                }
            }
        }
        out
    }
}

/// The cells supported by one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportSet {
    ranges: Vec<SupportRange>,
}

impl SupportSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[SupportRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of supported cells, counting overlaps twice.
    pub fn count(&self) -> usize {
        self.ranges.iter().map(SupportRange::count).sum()
    }

    /// Add the block `cols × rows` on `sheet` as supporters of `owner`.
    /// `owner` itself is never recorded: a range covering it is split
    /// around it first.
    pub fn add_support(&mut self, owner: FullCellAddress, sheet: SheetId, cols: Interval, rows: Interval) {
        let range = SupportRange::make(sheet, cols, rows);
        if range.contains(owner) {
            self.ranges.extend(range.split_around(owner));
        } else {
            self.ranges.push(range);
        }
    }

    /// Drop `at` from every range, splitting areas around it.
    pub fn remove_cell(&mut self, at: FullCellAddress) {
        if !self.ranges.iter().any(|r| r.contains(at)) {
            return;
        }
        let old = std::mem::take(&mut self.ranges);
        for range in old {
            self.ranges.extend(range.split_around(at));
        }
    }

    pub fn for_each_range(&self, mut act: impl FnMut(&SupportRange)) {
        for r in &self.ranges {
            act(r);
        }
    }

    /// Visit every supported cell. With `visited`, area cells already
    /// visited in the current propagation phase are skipped.
    pub fn for_each_supported(&self, mut visited: Option<&mut VisitedAreas>, mut act: impl FnMut(FullCellAddress)) {
        for range in &self.ranges {
            match range {
                SupportRange::Cell(c) => act(*c),
                SupportRange::Area(a) => match visited.as_deref_mut() {
                    Some(v) => v.visit(a, &mut act),
                    None => a.for_each(&mut act),
                },
            }
        }
    }
}

/// Areas already expanded during one propagation phase.
#[derive(Debug, Clone, Default)]
pub struct VisitedAreas {
    areas: Vec<SupportArea>,
}

impl VisitedAreas {
    pub fn clear(&mut self) {
        self.areas.clear();
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Call `act` for the cells of `area` not yet visited, and remember
    /// the area. Small areas are expanded without bookkeeping since
    /// tracking them would cost more than revisiting.
    pub fn visit(&mut self, area: &SupportArea, act: &mut dyn FnMut(FullCellAddress)) {
        if area.count() <= self.areas.len() + 1 {
            area.for_each(act);
            return;
        }
        for i in 0..self.areas.len() {
            let old = self.areas[i];
            if !old.overlaps(area) {
                continue;
            }
            let overlap = old.intersect(area);
            if old.contains_area(area) {
                return;
            }
            if area.contains_area(&old) {
                self.areas[i] = *area;
            } else if area.cols == old.cols {
                self.areas[i].rows = old.rows.union(area.rows);
            } else if area.rows == old.rows {
                self.areas[i].cols = old.cols.union(area.cols);
            } else {
                self.areas.push(*area);
            }
            area.for_each(|at| {
                if !overlap.contains(at) {
                    act(at);
                }
            });
            return;
        }
        self.areas.push(*area);
        area.for_each(act);
    }
}
