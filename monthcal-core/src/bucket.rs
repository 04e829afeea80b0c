//! Event bucketing: place each event on every grid day it spans.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::event::Event;
use crate::grid::Grid;

/// Events grouped by calendar day. Only days present in the grid appear;
/// within a day, events keep the order of the input list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBuckets {
    buckets: BTreeMap<NaiveDate, Vec<Event>>,
}

impl DayBuckets {
    pub fn events_on(&self, date: NaiveDate) -> &[Event] {
        self.buckets.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of days holding at least one event.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Days in date order with their events.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[Event])> {
        self.buckets
            .iter()
            .map(|(date, events)| (*date, events.as_slice()))
    }

    /// Total event placements; a three-day event counts three times.
    pub fn total_placements(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Bucket `events` onto the days of `grid`.
///
/// Each event covers its inclusive [start date, end date] range. Days outside
/// the grid are skipped, so events wholly outside it are dropped for this
/// render. Only the overlap with the grid is walked, which gives the same
/// result as stepping through the full range.
pub fn bucket_events(events: &[Event], grid: &Grid) -> DayBuckets {
    let mut buckets: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
    let mut dropped = 0usize;

    for event in events {
        let start = event.start_date();
        let end = event.end_date().max(start);

        let from = start.max(grid.first_date());
        let to = end.min(grid.last_date());

        if from > to {
            dropped += 1;
            continue;
        }

        for date in from.iter_days().take_while(|date| *date <= to) {
            buckets.entry(date).or_default().push(event.clone());
        }
    }

    debug!(
        month = %grid.month(),
        events = events.len(),
        days = buckets.len(),
        dropped,
        "Bucketed events"
    );

    DayBuckets { buckets }
}
