//! Date ranges and the per-property availability index

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Inclusive calendar date range (both the first and last night are blocked)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting an end date before the start date
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> AppResult<Self> {
        if end_date < start_date {
            return Err(AppError::Validation(format!(
                "End date {} is before start date {}",
                end_date, start_date
            )));
        }
        Ok(Self { start_date, end_date })
    }

    /// Inclusive overlap: ranges sharing a single day overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start_date <= other.end_date && self.end_date >= other.start_date
    }

    /// Number of nights covered
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start_date, self.end_date)
    }
}

/// Committed ranges of one property, kept sorted by start date.
///
/// Holds the invariant that no two committed ranges overlap: [`commit`]
/// refuses a range that conflicts with an existing one, so the check and the
/// insert cannot be separated by callers.
///
/// [`commit`]: AvailabilityIndex::commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityIndex {
    ranges: Vec<DateRange>,
}

impl AvailabilityIndex {
    /// Rebuild an index from persisted ranges.
    pub fn from_ranges(mut ranges: Vec<DateRange>) -> Self {
        ranges.sort_by_key(|r| (r.start_date, r.end_date));
        Self { ranges }
    }

    pub fn ranges(&self) -> &[DateRange] {
        &self.ranges
    }

    pub fn into_ranges(self) -> Vec<DateRange> {
        self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// First committed range that overlaps `range`, if any
    pub fn conflicting(&self, range: &DateRange) -> Option<&DateRange> {
        // Sorted by start: anything starting after range.end_date cannot overlap.
        self.ranges
            .iter()
            .take_while(|r| r.start_date <= range.end_date)
            .find(|r| r.overlaps(range))
    }

    pub fn overlaps(&self, range: &DateRange) -> bool {
        self.conflicting(range).is_some()
    }

    /// Add `range` to the committed set.
    pub fn commit(&mut self, range: DateRange) -> AppResult<()> {
        if let Some(existing) = self.conflicting(&range) {
            return Err(AppError::Conflict(format!(
                "Property already booked for the selected dates (overlaps {})",
                existing
            )));
        }
        let pos = self
            .ranges
            .partition_point(|r| (r.start_date, r.end_date) < (range.start_date, range.end_date));
        self.ranges.insert(pos, range);
        Ok(())
    }

    /// Remove the range exactly equal to `range`. Returns false when absent.
    pub fn release(&mut self, range: &DateRange) -> bool {
        match self.ranges.iter().position(|r| r == range) {
            Some(pos) => {
                self.ranges.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(d(start), d(end)).unwrap()
    }

    #[test]
    fn test_new_rejects_reversed_range() {
        assert!(matches!(
            DateRange::new(d("2024-06-05"), d("2024-06-01")),
            Err(AppError::Validation(_))
        ));
        assert_eq!(range("2024-06-01", "2024-06-01").nights(), 1);
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let a = range("2024-06-01", "2024-06-05");
        assert!(a.overlaps(&range("2024-06-05", "2024-06-10")));
        assert!(a.overlaps(&range("2024-05-20", "2024-06-01")));
        assert!(a.overlaps(&range("2024-06-02", "2024-06-03")));
        assert!(range("2024-06-02", "2024-06-03").overlaps(&a));
        assert!(!a.overlaps(&range("2024-06-06", "2024-06-10")));
        assert!(!a.overlaps(&range("2024-05-01", "2024-05-31")));
    }

    #[test]
    fn test_commit_refuses_overlap_and_keeps_order() {
        let mut index = AvailabilityIndex::default();
        index.commit(range("2024-06-06", "2024-06-10")).unwrap();
        index.commit(range("2024-06-01", "2024-06-05")).unwrap();
        assert!(matches!(
            index.commit(range("2024-06-05", "2024-06-06")),
            Err(AppError::Conflict(_))
        ));

        let starts: Vec<_> = index.ranges().iter().map(|r| r.start_date).collect();
        assert_eq!(starts, vec![d("2024-06-01"), d("2024-06-06")]);
    }

    #[test]
    fn test_conflicting_finds_range_behind_earlier_starts() {
        let index = AvailabilityIndex::from_ranges(vec![
            range("2024-07-01", "2024-07-03"),
            range("2024-06-01", "2024-06-20"),
        ]);
        assert_eq!(
            index.conflicting(&range("2024-06-15", "2024-06-16")),
            Some(&range("2024-06-01", "2024-06-20"))
        );
        assert!(!index.overlaps(&range("2024-06-21", "2024-06-30")));
    }

    #[test]
    fn test_release_requires_exact_match() {
        let mut index = AvailabilityIndex::from_ranges(vec![range("2024-06-01", "2024-06-05")]);
        assert!(!index.release(&range("2024-06-01", "2024-06-04")));
        assert!(index.release(&range("2024-06-01", "2024-06-05")));
        assert!(!index.release(&range("2024-06-01", "2024-06-05")));
        assert!(index.is_empty());
    }
}
