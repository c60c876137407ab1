use std::{fmt, ops::RangeInclusive};

/// A closed interval `[min, max]` of column or row indices.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    min: u32,
    max: u32,
}

impl Interval {
    /// Panics when `min > max`.
    pub fn new(min: u32, max: u32) -> Self {
        assert!(min <= max, "interval [{min}..{max}] is empty");
        Self { min, max }
    }

    pub fn point(at: u32) -> Self {
        Self { min: at, max: at }
    }

    /// The interval spanning `a` and `b` in either order.
    pub fn spanning(a: u32, b: u32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn min(self) -> u32 {
        self.min
    }

    #[inline]
    pub fn max(self) -> u32 {
        self.max
    }

    #[inline]
    pub fn len(self) -> usize {
        (self.max - self.min) as usize + 1
    }

    #[inline]
    pub fn is_point(self) -> bool {
        self.min == self.max
    }

    #[inline]
    pub fn contains(self, v: u32) -> bool {
        self.min <= v && v <= self.max
    }

    pub fn contains_interval(self, other: Interval) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    pub fn overlaps(self, other: Interval) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Smallest interval covering both. Panics unless the two overlap.
    pub fn union(self, other: Interval) -> Interval {
        assert!(self.overlaps(other), "union of disjoint {self} and {other}");
        Interval {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Common part of both. Panics unless the two overlap.
    pub fn intersect(self, other: Interval) -> Interval {
        assert!(
            self.overlaps(other),
            "intersection of disjoint {self} and {other}"
        );
        Interval {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    pub fn iter(self) -> RangeInclusive<u32> {
        self.min..=self.max
    }
}

impl IntoIterator for Interval {
    type Item = u32;
    type IntoIter = RangeInclusive<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.min, self.max)
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn overlap_and_containment() {
        let a = Interval::new(2, 5);
        assert!(a.overlaps(Interval::new(5, 9)));
        assert!(!a.overlaps(Interval::new(6, 9)));
        assert!(a.contains_interval(Interval::new(3, 4)));
        assert!(!a.contains_interval(Interval::new(1, 4)));
        assert_eq!(a.len(), 4);
        assert_eq!(Interval::spanning(7, 3), Interval::new(3, 7));
    }

    #[test]
    #[should_panic]
    fn union_of_disjoint_panics() {
        Interval::new(0, 1).union(Interval::new(3, 4));
    }

    #[test]
    #[should_panic]
    fn empty_interval_panics() {
        Interval::new(4, 3);
    }

    proptest! {
        #[test]
        fn intersect_is_contained_in_both(a in 0u32..100, b in 0u32..100, c in 0u32..100, d in 0u32..100) {
            let x = Interval::spanning(a, b);
            let y = Interval::spanning(c, d);
            if x.overlaps(y) {
                let i = x.intersect(y);
                let u = x.union(y);
                prop_assert!(x.contains_interval(i) && y.contains_interval(i));
                prop_assert!(u.contains_interval(x) && u.contains_interval(y));
            }
        }
    }
}
