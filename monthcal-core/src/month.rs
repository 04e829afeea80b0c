//! The (year, month) pair a calendar view is showing.

use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::error::{CalendarError, CalendarResult};

/// A reference month. Months are 0-based throughout the API (January = 0);
/// `number()` gives the 1-based form used in requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth {
    first: NaiveDate,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> CalendarResult<Self> {
        if month > 11 {
            return Err(CalendarError::InvalidMonth(month));
        }

        let first = NaiveDate::from_ymd_opt(year, month + 1, 1).ok_or_else(|| {
            CalendarError::DateOutOfRange(format!("{}-{:02}", year, month + 1))
        })?;

        Ok(CalendarMonth { first })
    }

    /// Build from a 1-based month number (January = 1), as typed by users
    /// and sent to the events endpoint.
    pub fn from_number(year: i32, number: u32) -> CalendarResult<Self> {
        match number {
            1..=12 => Self::new(year, number - 1),
            _ => Err(CalendarError::InvalidMonth(number)),
        }
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        CalendarMonth {
            first: date - Duration::days(i64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// 0-based month (January = 0).
    pub fn month0(&self) -> u32 {
        self.first.month0()
    }

    /// 1-based month (January = 1).
    pub fn number(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        // Only December of the last representable year has no next month
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Days in the month, leap years included.
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// The month `delta` months away, rolling the year as needed.
    pub fn offset(&self, delta: i32) -> CalendarResult<Self> {
        let index = i64::from(self.year()) * 12 + i64::from(self.month0()) + i64::from(delta);
        let year = i32::try_from(index.div_euclid(12))
            .map_err(|_| CalendarError::DateOutOfRange(format!("{} months from {}", delta, self)))?;
        let month = index.rem_euclid(12) as u32;

        Self::new(year, month)
    }

    pub fn next(&self) -> CalendarResult<Self> {
        self.offset(1)
    }

    pub fn previous(&self) -> CalendarResult<Self> {
        self.offset(-1)
    }

    /// Human-readable heading, e.g. "March 2024".
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.number())
    }
}
