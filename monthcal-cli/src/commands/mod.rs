pub mod auth;
pub mod browse;
pub mod config;
pub mod show;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use monthcal_core::calendar::{ApplyOutcome, MonthCalendar};
use monthcal_core::config::MonthcalConfig;
use monthcal_core::event::EventRecord;
use monthcal_core::month::CalendarMonth;
use monthcal_core::source::{EventSource, HttpEventSource, JsonFileSource};
use monthcal_core::CalendarResult;

use crate::utils::tui::create_spinner;

/// The server, or a local file when `--file` is given.
pub enum AnySource {
    Http(HttpEventSource),
    File(JsonFileSource),
}

impl EventSource for AnySource {
    async fn fetch_month(&self, month: CalendarMonth) -> CalendarResult<Vec<EventRecord>> {
        match self {
            AnySource::Http(source) => source.fetch_month(month).await,
            AnySource::File(source) => source.fetch_month(month).await,
        }
    }
}

pub fn open_calendar(
    config: &MonthcalConfig,
    month: CalendarMonth,
    file: Option<PathBuf>,
) -> Result<MonthCalendar<AnySource>> {
    let source = match file {
        Some(path) => AnySource::File(JsonFileSource::new(path)),
        None => AnySource::Http(HttpEventSource::from_config(config)?),
    };

    let calendar = MonthCalendar::new(source, month, config.first_day_of_week()?)?
        .with_timezone(display_timezone(config)?);

    Ok(calendar)
}

/// Load the calendar's current month behind a spinner.
pub async fn load_with_spinner(calendar: &mut MonthCalendar<AnySource>) -> ApplyOutcome {
    let spinner = create_spinner(format!(
        "Fetching events for {}",
        calendar.current_month().label()
    ));
    let outcome = calendar.load().await;
    spinner.finish_and_clear();
    outcome
}

/// Configured timezone, else the system one. None if neither is known.
pub fn display_timezone(config: &MonthcalConfig) -> Result<Option<Tz>> {
    if let Some(tz) = config.timezone()? {
        return Ok(Some(tz));
    }

    Ok(iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok()))
}

pub fn today(tz: Option<Tz>) -> NaiveDate {
    match tz {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Local::now().date_naive(),
    }
}
