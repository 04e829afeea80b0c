//! Core types for monthcal.
//!
//! - `grid` and `bucket` lay out a month in whole weeks and place events on
//!   every day they span
//! - `presentation` decides how each day cell is shown
//! - `calendar` drives month navigation and guards against stale replies
//! - `source` and `auth` talk to the web application

pub mod auth;
pub mod bucket;
pub mod calendar;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod month;
pub mod presentation;
pub mod source;

pub use bucket::{DayBuckets, bucket_events};
pub use calendar::{ApplyOutcome, FetchTicket, LoadState, MonthCalendar, MonthView};
pub use error::{CalendarError, CalendarResult};
pub use event::{Event, EventCategory, EventRecord};
pub use grid::{Grid, GridCell, compute_grid};
pub use month::CalendarMonth;
