//! Time span value type.
//!
//! A [`TimeSpan`] is an immutable inclusive date interval at day
//! granularity. Spans are replaced, never mutated in place; every
//! constructor upholds `start <= end`, with the zero-width form reserved
//! for checkpoints (milestones).

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// An inclusive date interval with `start <= end`.
///
/// Ordering is by start date, then by end date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gantt_core::models::TimeSpan;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let a = TimeSpan::new(d(1), d(10)).unwrap();
/// let b = TimeSpan::new(d(11), d(15)).unwrap();
/// assert_eq!(a.union(&b), TimeSpan::new(d(1), d(15)).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeSpan {
    /// Creates a span, rejecting inverted inputs.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ChartError> {
        if end < start {
            return Err(ChartError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a zero-width span at `date` (the checkpoint form).
    pub fn point(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Start date (inclusive).
    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// End date (inclusive).
    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether this span is zero-width (`start == end`).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// Number of whole days between start and end.
    #[inline]
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Smallest span covering both `self` and `other`.
    pub fn union(&self, other: &TimeSpan) -> TimeSpan {
        TimeSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether the two spans share at least one day.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The same-duration span shifted by `days` (negative shifts left).
    pub fn shifted_days(&self, days: i64) -> TimeSpan {
        let shift = |d: NaiveDate| {
            if days >= 0 {
                d.checked_add_days(Days::new(days as u64)).unwrap_or(d)
            } else {
                d.checked_sub_days(Days::new((-days) as u64)).unwrap_or(d)
            }
        };
        TimeSpan {
            start: shift(self.start),
            end: shift(self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_rejects_inverted_span() {
        let err = TimeSpan::new(d(10), d(5)).unwrap_err();
        assert_eq!(
            err,
            ChartError::InvalidSpan {
                start: d(10),
                end: d(5)
            }
        );
    }

    #[test]
    fn test_point_is_degenerate() {
        let p = TimeSpan::point(d(7));
        assert!(p.is_degenerate());
        assert_eq!(p.duration_days(), 0);
    }

    #[test]
    fn test_union_covers_both() {
        let a = TimeSpan::new(d(3), d(8)).unwrap();
        let b = TimeSpan::new(d(6), d(20)).unwrap();
        let u = a.union(&b);
        assert_eq!(u.start(), d(3));
        assert_eq!(u.end(), d(20));
        // Union of disjoint spans bridges the gap.
        let c = TimeSpan::new(d(25), d(28)).unwrap();
        assert_eq!(a.union(&c), TimeSpan::new(d(3), d(28)).unwrap());
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let a = TimeSpan::new(d(1), d(10)).unwrap();
        let b = TimeSpan::new(d(10), d(15)).unwrap();
        let c = TimeSpan::new(d(11), d(15)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_ordering_by_start_then_end() {
        let a = TimeSpan::new(d(1), d(5)).unwrap();
        let b = TimeSpan::new(d(1), d(8)).unwrap();
        let c = TimeSpan::new(d(2), d(3)).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_shifted_days() {
        let a = TimeSpan::new(d(5), d(8)).unwrap();
        assert_eq!(a.shifted_days(3), TimeSpan::new(d(8), d(11)).unwrap());
        assert_eq!(a.shifted_days(-4), TimeSpan::new(d(1), d(4)).unwrap());
        assert_eq!(a.shifted_days(0), a);
    }

    #[test]
    fn test_serde_round_trip() {
        let a = TimeSpan::new(d(5), d(8)).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        let back: TimeSpan = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
