//! Month grid geometry.
//!
//! A grid covers one month in whole weeks: the trailing days of the previous
//! month needed so the first column is the configured first day of week, the
//! month itself, then the leading days of the next month to finish the last row.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{CalendarError, CalendarResult};
use crate::month::CalendarMonth;

const DAYS_PER_WEEK: u32 = 7;

/// Convert a weekday index (0 = Sunday .. 6 = Saturday) into a `Weekday`.
pub fn weekday_from_index(index: u8) -> CalendarResult<Weekday> {
    match index {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        _ => Err(CalendarError::InvalidFirstDayOfWeek(index)),
    }
}

/// One day slot of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub date: NaiveDate,
    /// False for the padding days borrowed from adjacent months.
    pub in_month: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    month: CalendarMonth,
    first_day_of_week: Weekday,
    start: NaiveDate,
    leading: u32,
    cells: Vec<GridCell>,
}

impl Grid {
    pub fn for_month(month: CalendarMonth, first_day_of_week: Weekday) -> CalendarResult<Self> {
        let first = month.first_day();
        let native = first.weekday().num_days_from_sunday();
        let leading = (native + DAYS_PER_WEEK - first_day_of_week.num_days_from_sunday())
            % DAYS_PER_WEEK;
        let days = month.days_in_month();
        let total = (leading + days).div_ceil(DAYS_PER_WEEK) * DAYS_PER_WEEK;

        let out_of_range = || CalendarError::DateOutOfRange(format!("grid for {}", month));

        let start = first
            .checked_sub_signed(Duration::days(i64::from(leading)))
            .ok_or_else(out_of_range)?;

        let cells = (0..total)
            .map(|i| {
                start
                    .checked_add_signed(Duration::days(i64::from(i)))
                    .map(|date| GridCell {
                        date,
                        in_month: i >= leading && i < leading + days,
                    })
                    .ok_or_else(out_of_range)
            })
            .collect::<CalendarResult<Vec<_>>>()?;

        Ok(Grid {
            month,
            first_day_of_week,
            start,
            leading,
            cells,
        })
    }

    pub fn month(&self) -> CalendarMonth {
        self.month
    }

    pub fn first_day_of_week(&self) -> Weekday {
        self.first_day_of_week
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of previous-month days before the 1st.
    pub fn leading_days(&self) -> u32 {
        self.leading
    }

    /// Whole weeks, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(DAYS_PER_WEEK as usize)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.start
    }

    pub fn last_date(&self) -> NaiveDate {
        self.cells.last().map_or(self.start, |cell| cell.date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_date() && date <= self.last_date()
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&GridCell> {
        let index = usize::try_from((date - self.start).num_days()).ok()?;
        self.cells.get(index)
    }

    pub fn in_month_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.in_month).count()
    }

    /// Weekday of each column, left to right.
    pub fn weekday_headers(&self) -> [Weekday; 7] {
        let mut day = self.first_day_of_week;
        std::array::from_fn(|_| {
            let current = day;
            day = day.succ();
            current
        })
    }
}

/// Compute the grid for a 0-based `month` of `year`, with rows starting on
/// `first_day_of_week` (0 = Sunday .. 6 = Saturday).
pub fn compute_grid(year: i32, month: u32, first_day_of_week: u8) -> CalendarResult<Grid> {
    let month = CalendarMonth::new(year, month)?;
    let weekday = weekday_from_index(first_day_of_week)?;
    Grid::for_month(month, weekday)
}
