use chrono::NaiveDate;

use crate::error::PlanError;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<DateWindow, PlanError> {
        if start > end {
            return Err(PlanError::InvertedWindow { start, end });
        }
        Ok(DateWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Days to skip when planning. A range whose first bound is after its
/// second covers nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionRange {
    first: NaiveDate,
    last: NaiveDate,
}

impl ExclusionRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> ExclusionRange {
        ExclusionRange { first, last }
    }

    /// Builds a range from configured bounds. Entries with fewer than two
    /// bounds are not ranges and yield `None`; extra bounds are ignored.
    pub fn from_bounds(bounds: &[NaiveDate]) -> Option<ExclusionRange> {
        match bounds {
            [first, last, ..] => Some(ExclusionRange::new(*first, *last)),
            _ => None,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first <= day && day <= self.last
    }
}

/// Every day of the window in ascending order, minus excluded days.
pub fn plan(window: &DateWindow, exclusions: &[ExclusionRange]) -> Vec<NaiveDate> {
    window
        .days()
        .filter(|day| !exclusions.iter().any(|range| range.contains(*day)))
        .collect()
}
