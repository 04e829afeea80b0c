//! Month navigation and the fetch → render cycle.
//!
//! A `MonthCalendar` shows one month at a time. Moving to another month
//! renders its empty grid straight away and hands out a `FetchTicket`; the
//! fetched records are applied against that ticket. Only the most recently
//! issued ticket is honoured, so a slow reply for a month the user has
//! already left never overwrites the current view.

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::bucket::{DayBuckets, bucket_events};
use crate::error::CalendarResult;
use crate::event::{EventRecord, events_from_records};
use crate::grid::Grid;
use crate::month::CalendarMonth;
use crate::presentation::{CellView, present};
use crate::source::EventSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Grid drawn, events not arrived yet.
    Pending,
    Loaded,
    /// Fetch failed; the grid is shown without events.
    Failed,
}

/// One render pass: the grid of a month and the events bucketed onto it.
#[derive(Debug, Clone)]
pub struct MonthView {
    grid: Grid,
    buckets: DayBuckets,
    state: LoadState,
}

impl MonthView {
    fn pending(grid: Grid) -> Self {
        MonthView {
            grid,
            buckets: DayBuckets::default(),
            state: LoadState::Pending,
        }
    }

    pub fn month(&self) -> CalendarMonth {
        self.grid.month()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn buckets(&self) -> &DayBuckets {
        &self.buckets
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn cells(&self, today: NaiveDate) -> Vec<CellView<'_>> {
        present(&self.grid, &self.buckets, today)
    }
}

/// Tags a fetch with the month and navigation step it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    month: CalendarMonth,
    generation: u64,
}

impl FetchTicket {
    pub fn month(&self) -> CalendarMonth {
        self.month
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Loaded { events: usize, skipped: usize },
    Failed,
    /// The ticket was superseded; the view was left alone.
    Stale,
}

pub struct MonthCalendar<S> {
    source: S,
    first_day_of_week: Weekday,
    timezone: Option<Tz>,
    month: CalendarMonth,
    generation: u64,
    view: MonthView,
}

impl<S: EventSource> MonthCalendar<S> {
    pub fn new(source: S, month: CalendarMonth, first_day_of_week: Weekday) -> CalendarResult<Self> {
        let grid = Grid::for_month(month, first_day_of_week)?;

        Ok(MonthCalendar {
            source,
            first_day_of_week,
            timezone: None,
            month,
            generation: 0,
            view: MonthView::pending(grid),
        })
    }

    /// Timezone offset timestamps are converted into before bucketing.
    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn current_month(&self) -> CalendarMonth {
        self.month
    }

    pub fn view(&self) -> &MonthView {
        &self.view
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Issue a ticket for the current month. Any older ticket becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.view.state = LoadState::Pending;

        FetchTicket {
            month: self.month,
            generation: self.generation,
        }
    }

    /// Move `delta` months, showing the new month's empty grid immediately.
    pub fn navigate(&mut self, delta: i32) -> CalendarResult<FetchTicket> {
        let month = self.month.offset(delta)?;
        let grid = Grid::for_month(month, self.first_day_of_week)?;

        debug!(from = %self.month, to = %month, "Navigating");

        self.month = month;
        self.view = MonthView::pending(grid);
        Ok(self.begin_fetch())
    }

    /// Apply the result of the fetch issued with `ticket`.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: CalendarResult<Vec<EventRecord>>,
    ) -> ApplyOutcome {
        if ticket.generation != self.generation || ticket.month != self.month {
            warn!(
                ticket = %ticket.month,
                current = %self.month,
                "Ignoring stale event response"
            );
            return ApplyOutcome::Stale;
        }

        match result {
            Ok(records) => {
                let events = events_from_records(&records, self.timezone);
                self.view.buckets = bucket_events(&events, &self.view.grid);
                self.view.state = LoadState::Loaded;

                ApplyOutcome::Loaded {
                    events: events.len(),
                    skipped: records.len() - events.len(),
                }
            }
            Err(e) => {
                warn!(month = %self.month, error = %e, "Failed to fetch events");
                self.view.buckets = DayBuckets::default();
                self.view.state = LoadState::Failed;
                ApplyOutcome::Failed
            }
        }
    }

    /// Fetch and apply events for the current month.
    pub async fn load(&mut self) -> ApplyOutcome {
        let ticket = self.begin_fetch();
        let result = self.source.fetch_month(ticket.month).await;
        self.apply(ticket, result)
    }

    /// Navigate and load in one step.
    pub async fn go(&mut self, delta: i32) -> CalendarResult<ApplyOutcome> {
        let ticket = self.navigate(delta)?;
        let result = self.source.fetch_month(ticket.month).await;
        Ok(self.apply(ticket, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalendarError;
    use crate::event::RecordId;
    use crate::presentation::CellContent;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned records per month; months without an entry fail.
    #[derive(Default)]
    struct FakeSource {
        months: HashMap<CalendarMonth, Vec<EventRecord>>,
        requests: Mutex<Vec<CalendarMonth>>,
    }

    impl FakeSource {
        fn with(mut self, month: CalendarMonth, records: Vec<EventRecord>) -> Self {
            self.months.insert(month, records);
            self
        }
    }

    impl EventSource for FakeSource {
        async fn fetch_month(&self, month: CalendarMonth) -> CalendarResult<Vec<EventRecord>> {
            self.requests.lock().unwrap().push(month);
            self.months
                .get(&month)
                .cloned()
                .ok_or_else(|| CalendarError::Http("connection refused".into()))
        }
    }

    fn record(id: i64, start: &str) -> EventRecord {
        EventRecord {
            id: Some(RecordId::Number(id)),
            title: format!("Event {}", id),
            start: Some(start.into()),
            ..Default::default()
        }
    }

    fn month(year: i32, month0: u32) -> CalendarMonth {
        CalendarMonth::new(year, month0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_grid_is_drawn_before_any_fetch() {
        let calendar = MonthCalendar::new(FakeSource::default(), month(2024, 2), Weekday::Mon).unwrap();

        assert_eq!(calendar.view().state(), LoadState::Pending);
        assert_eq!(calendar.view().grid().in_month_count(), 31);
        assert!(calendar.view().buckets().is_empty());
    }

    #[tokio::test]
    async fn test_load_buckets_fetched_events() {
        let source = FakeSource::default().with(
            month(2024, 2),
            vec![
                record(1, "2024-03-15T10:00:00"),
                record(2, "2024-03-15T09:00:00"),
                EventRecord::default(),
            ],
        );
        let mut calendar = MonthCalendar::new(source, month(2024, 2), Weekday::Mon).unwrap();

        let outcome = calendar.load().await;

        assert_eq!(outcome, ApplyOutcome::Loaded { events: 2, skipped: 1 });
        assert_eq!(calendar.view().state(), LoadState::Loaded);

        let cells = calendar.view().cells(date(2024, 3, 1));
        let busy = cells.iter().find(|c| c.date == date(2024, 3, 15)).unwrap();
        assert!(matches!(busy.content, CellContent::Multiple { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_failed_fetch_renders_empty_grid() {
        let mut calendar =
            MonthCalendar::new(FakeSource::default(), month(2024, 2), Weekday::Mon).unwrap();

        assert_eq!(calendar.load().await, ApplyOutcome::Failed);
        assert_eq!(calendar.view().state(), LoadState::Failed);
        assert!(calendar.view().buckets().is_empty());
        assert_eq!(calendar.view().grid().len(), 35);
    }

    #[tokio::test]
    async fn test_go_requests_adjacent_months_across_year_boundary() {
        let source = FakeSource::default()
            .with(month(2025, 0), vec![record(1, "2025-01-10")])
            .with(month(2024, 11), vec![]);
        let mut calendar = MonthCalendar::new(source, month(2024, 11), Weekday::Mon).unwrap();

        let outcome = calendar.go(1).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Loaded { events: 1, skipped: 0 });
        assert_eq!(calendar.current_month(), month(2025, 0));

        calendar.go(-1).await.unwrap();
        assert_eq!(calendar.current_month(), month(2024, 11));

        let requests = calendar.source().requests.lock().unwrap().clone();
        assert_eq!(requests, vec![month(2025, 0), month(2024, 11)]);
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut calendar =
            MonthCalendar::new(FakeSource::default(), month(2024, 2), Weekday::Mon).unwrap();

        let april = calendar.navigate(1).unwrap();
        let may = calendar.navigate(1).unwrap();
        assert_eq!(april.month(), month(2024, 3));
        assert_eq!(may.month(), month(2024, 4));

        // April's reply arrives after the user moved on to May
        let outcome = calendar.apply(april, Ok(vec![record(1, "2024-04-10")]));
        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(calendar.view().buckets().is_empty());
        assert_eq!(calendar.view().state(), LoadState::Pending);

        let outcome = calendar.apply(may, Ok(vec![record(2, "2024-05-10")]));
        assert_eq!(outcome, ApplyOutcome::Loaded { events: 1, skipped: 0 });
        assert_eq!(calendar.view().buckets().events_on(date(2024, 5, 10)).len(), 1);
    }

    #[test]
    fn test_reply_for_same_month_from_earlier_visit_is_stale() {
        let mut calendar =
            MonthCalendar::new(FakeSource::default(), month(2024, 2), Weekday::Mon).unwrap();

        let first_visit = calendar.begin_fetch();
        calendar.navigate(1).unwrap();
        let second_visit = calendar.navigate(-1).unwrap();
        assert_eq!(first_visit.month(), second_visit.month());

        assert_eq!(calendar.apply(first_visit, Ok(vec![])), ApplyOutcome::Stale);
        assert_eq!(
            calendar.apply(second_visit, Err(CalendarError::Http("timeout".into()))),
            ApplyOutcome::Failed
        );
    }
}
