//! Presentation policy for grid cells.
//!
//! Decides how a day is shown, independent of the render target: nothing,
//! a single coloured event, or a count summary with a time-ordered listing.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Weekday};

use crate::bucket::DayBuckets;
use crate::event::{Event, EventCategory};
use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Colour for categories outside the table.
pub const DEFAULT_COLOR: Color = Color::rgb(0x60, 0x7D, 0x8B);

pub fn category_color(category: &EventCategory) -> Color {
    match category {
        EventCategory::Workshop => Color::rgb(0x42, 0x85, 0xF4),
        EventCategory::Seminar => Color::rgb(0x0F, 0x9D, 0x58),
        EventCategory::Conference => Color::rgb(0xDB, 0x44, 0x37),
        EventCategory::Networking => Color::rgb(0xF4, 0xB4, 0x00),
        EventCategory::Competition => Color::rgb(0x9C, 0x27, 0xB0),
        EventCategory::Social => Color::rgb(0x00, 0xAC, 0xC1),
        EventCategory::Project => Color::rgb(0xFF, 0x57, 0x22),
        EventCategory::Other => Color::rgb(0x79, 0x55, 0x48),
        EventCategory::Unknown(_) => DEFAULT_COLOR,
    }
}

/// What a single day cell shows.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent<'a> {
    Empty,
    Single {
        event: &'a Event,
        color: Color,
    },
    /// Listing is ordered by start time; equal starts keep arrival order.
    Multiple {
        count: usize,
        listing: Vec<&'a Event>,
    },
}

impl CellContent<'_> {
    pub fn event_count(&self) -> usize {
        match self {
            CellContent::Empty => 0,
            CellContent::Single { .. } => 1,
            CellContent::Multiple { count, .. } => *count,
        }
    }
}

pub fn cell_content(events: &[Event]) -> CellContent<'_> {
    match events {
        [] => CellContent::Empty,
        [event] => CellContent::Single {
            event,
            color: category_color(&event.category),
        },
        many => {
            let mut listing: Vec<&Event> = many.iter().collect();
            listing.sort_by_key(|event| event.start);
            CellContent::Multiple {
                count: many.len(),
                listing,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView<'a> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub content: CellContent<'a>,
}

/// Presentation for every grid cell, in grid order.
pub fn present<'a>(grid: &Grid, buckets: &'a DayBuckets, today: NaiveDate) -> Vec<CellView<'a>> {
    grid.cells()
        .iter()
        .map(|cell| CellView {
            date: cell.date,
            in_month: cell.in_month,
            is_today: cell.date == today,
            content: cell_content(buckets.events_on(cell.date)),
        })
        .collect()
}

pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Column headings for the grid, left to right.
pub fn weekday_labels(grid: &Grid) -> [&'static str; 7] {
    grid.weekday_headers().map(weekday_label)
}

/// Count summary shown in a cell with several events, e.g. "3 Events".
pub fn summary_label(count: usize) -> String {
    format!("{} Events", count)
}

/// Heading of the expanded listing, e.g. "3 Events on Fri Mar 15".
pub fn listing_heading(count: usize, date: NaiveDate) -> String {
    format!("{} Events on {}", count, date.format("%a %b %-d"))
}

/// Start time as shown in listings.
pub fn format_time(time: NaiveDateTime) -> String {
    time.format("%H:%M").to_string()
}
