//! Calendar events and their wire representation.
//!
//! `EventRecord` is what the events endpoint sends: loosely typed, with the
//! field-name variants the server has used over time. `Event` is the checked
//! form the grid works with: a parsed start, an end that is never before the
//! start, and a category from the fixed set used for colouring.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CalendarError, CalendarResult};

/// Event category. Only used to pick a colour; unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventCategory {
    Workshop,
    Seminar,
    Conference,
    Networking,
    Competition,
    Social,
    Project,
    Other,
    Unknown(String),
}

impl EventCategory {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "workshop" => EventCategory::Workshop,
            "seminar" => EventCategory::Seminar,
            "conference" => EventCategory::Conference,
            "networking" => EventCategory::Networking,
            "competition" => EventCategory::Competition,
            "social" => EventCategory::Social,
            "project" => EventCategory::Project,
            "other" => EventCategory::Other,
            _ => EventCategory::Unknown(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventCategory::Workshop => "workshop",
            EventCategory::Seminar => "seminar",
            EventCategory::Conference => "conference",
            EventCategory::Networking => "networking",
            EventCategory::Competition => "competition",
            EventCategory::Social => "social",
            EventCategory::Project => "project",
            EventCategory::Other => "other",
            EventCategory::Unknown(tag) => tag,
        }
    }
}

impl From<String> for EventCategory {
    fn from(tag: String) -> Self {
        EventCategory::parse(&tag)
    }
}

impl From<EventCategory> for String {
    fn from(category: EventCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar event, ready to be placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub category: EventCategory,
    pub start: NaiveDateTime,
    /// None means a single-day event.
    pub end: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Detail page supplied by the server, if any.
    pub url: Option<String>,
}

impl Event {
    pub fn new(id: impl Into<String>, title: impl Into<String>, start: NaiveDateTime) -> Self {
        Event {
            id: id.into(),
            title: title.into(),
            category: EventCategory::Other,
            start,
            end: None,
            description: None,
            location: None,
            url: None,
        }
    }

    /// Set the end, clamping it to the start when it comes first.
    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end.max(self.start));
        self
    }

    pub fn with_category(mut self, category: EventCategory) -> Self {
        self.category = category;
        self
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.map_or(self.start_date(), |end| end.date())
    }

    pub fn is_multi_day(&self) -> bool {
        self.end_date() > self.start_date()
    }

    /// Where the event's detail view lives.
    pub fn detail_path(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("/events/{}/", self.id),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Identifiers arrive as integers from some endpoints and strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// An event as sent by the events endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default, alias = "start_date")]
    pub start: Option<String>,
    #[serde(default, alias = "end_date")]
    pub end: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl EventRecord {
    /// Parse a JSON array of records. A record that does not fit the shape is
    /// skipped; only a body that is not an array at all is an error.
    pub fn parse_batch(body: &str) -> CalendarResult<Vec<EventRecord>> {
        let values: Vec<serde_json::Value> = serde_json::from_str(body)?;

        Ok(values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index, error = %e, "Skipping event record with unexpected shape");
                    None
                }
            })
            .collect())
    }

    /// Check and convert into an `Event`. Timestamps with an offset are
    /// converted into `timezone` when given.
    pub fn to_event(&self, timezone: Option<Tz>) -> CalendarResult<Event> {
        let id = match &self.id {
            Some(RecordId::Text(s)) if s.trim().is_empty() => None,
            Some(id) => Some(id.to_string()),
            None => None,
        }
        .ok_or_else(|| CalendarError::MalformedEvent(format!("'{}' has no id", self.title)))?;

        let raw_start = self.start.as_deref().ok_or_else(|| {
            CalendarError::MalformedEvent(format!("event {} has no start timestamp", id))
        })?;

        let start = parse_timestamp(raw_start, timezone).ok_or_else(|| {
            CalendarError::MalformedEvent(format!(
                "event {} has unreadable start '{}'",
                id, raw_start
            ))
        })?;

        let end = match self.end.as_deref() {
            None => None,
            Some(raw) => match parse_timestamp(raw, timezone) {
                Some(end) if end < start => {
                    warn!(event = %id, "End is before start, treating as single-day");
                    Some(start)
                }
                Some(end) => Some(end),
                None => {
                    warn!(event = %id, end = raw, "Unreadable end, treating as single-day");
                    None
                }
            },
        };

        let category = self
            .category
            .as_deref()
            .or(self.event_type.as_deref())
            .filter(|tag| !tag.trim().is_empty())
            .map_or(EventCategory::Other, EventCategory::parse);

        Ok(Event {
            id,
            title: self.title.clone(),
            category,
            start,
            end,
            description: self.description.clone(),
            location: self.location.clone(),
            url: self.url.clone(),
        })
    }
}

/// Convert records into events, skipping the malformed ones.
pub fn events_from_records(records: &[EventRecord], timezone: Option<Tz>) -> Vec<Event> {
    records
        .iter()
        .filter_map(|record| match record.to_event(timezone) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Skipping malformed event");
                None
            }
        })
        .collect()
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 timestamp into wall-clock time.
///
/// Accepts RFC 3339 (offset or `Z`), naive date-times and bare dates
/// (midnight). Offset timestamps are shifted into `timezone` when given,
/// otherwise their own wall-clock reading is kept.
pub fn parse_timestamp(raw: &str, timezone: Option<Tz>) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    let with_offset = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z"));

    if let Ok(dt) = with_offset {
        return Some(match timezone {
            Some(tz) => dt.with_timezone(&tz).naive_local(),
            None => dt.naive_local(),
        });
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert_eq!(
            parse_timestamp("2024-03-15T10:30:00", None),
            Some(at(2024, 3, 15, 10, 30))
        );
        assert_eq!(
            parse_timestamp("2024-03-15T10:30", None),
            Some(at(2024, 3, 15, 10, 30))
        );
        assert_eq!(
            parse_timestamp("2024-03-15T10:30:00.123456", None).map(|t| t.date()),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            parse_timestamp("2024-03-15", None),
            Some(at(2024, 3, 15, 0, 0))
        );
        assert_eq!(
            parse_timestamp("2024-03-15T23:30:00+03:00", None),
            Some(at(2024, 3, 15, 23, 30))
        );
        assert_eq!(parse_timestamp("next tuesday", None), None);
    }

    #[test]
    fn test_parse_timestamp_converts_into_timezone() {
        let parsed = parse_timestamp("2024-03-15T23:30:00Z", Some(chrono_tz::Africa::Nairobi));
        assert_eq!(parsed, Some(at(2024, 3, 16, 2, 30)));
    }

    #[test]
    fn test_record_accepts_both_field_spellings() {
        let body = r#"[
            {"id": 7, "title": "Rust meetup", "category": "networking",
             "start": "2024-03-15T18:00:00", "end": "2024-03-15T20:00:00"},
            {"id": "abc", "title": "Hackathon", "category": "competition",
             "start_date": "2024-03-16T09:00:00", "end_date": "2024-03-17T17:00:00"}
        ]"#;

        let records = EventRecord::parse_batch(body).unwrap();
        let events = events_from_records(&records, None);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "7");
        assert_eq!(events[0].category, EventCategory::Networking);
        assert!(!events[0].is_multi_day());
        assert_eq!(events[1].id, "abc");
        assert_eq!(events[1].start, at(2024, 3, 16, 9, 0));
        assert!(events[1].is_multi_day());
    }

    #[test]
    fn test_malformed_records_are_skipped_not_fatal() {
        let body = r#"[
            {"id": 1, "title": "No start"},
            {"id": 2, "title": "Garbled", "start": "soon"},
            {"title": "No id", "start": "2024-03-15"},
            {"id": 3, "title": ["not", "a", "string"], "start": "2024-03-15"},
            {"id": 4, "title": "Fine", "start": "2024-03-15"}
        ]"#;

        let records = EventRecord::parse_batch(body).unwrap();
        assert_eq!(records.len(), 4);

        let events = events_from_records(&records, None);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Fine");
    }

    #[test]
    fn test_non_array_body_is_an_error() {
        assert!(EventRecord::parse_batch(r#"{"error": "nope"}"#).is_err());
    }

    #[test]
    fn test_end_before_start_is_clamped() {
        let record = EventRecord {
            id: Some(RecordId::Number(1)),
            title: "Backwards".into(),
            start: Some("2024-03-15T10:00:00".into()),
            end: Some("2024-03-10T10:00:00".into()),
            ..Default::default()
        };

        let event = record.to_event(None).unwrap();
        assert_eq!(event.end, Some(event.start));
        assert_eq!(event.end_date(), event.start_date());

        let built = Event::new("2", "Also backwards", at(2024, 3, 15, 10, 0))
            .with_end(at(2024, 3, 1, 0, 0));
        assert_eq!(built.end, Some(built.start));
    }

    #[test]
    fn test_category_falls_back_to_event_type_then_other() {
        let mut record = EventRecord {
            id: Some(RecordId::Number(1)),
            start: Some("2024-03-15".into()),
            event_type: Some("Seminar".into()),
            ..Default::default()
        };
        assert_eq!(record.to_event(None).unwrap().category, EventCategory::Seminar);

        record.event_type = None;
        assert_eq!(record.to_event(None).unwrap().category, EventCategory::Other);

        record.category = Some("bake-off".into());
        assert_eq!(
            record.to_event(None).unwrap().category,
            EventCategory::Unknown("bake-off".into())
        );
    }

    #[test]
    fn test_detail_path_prefers_server_url() {
        let mut event = Event::new("42", "Talk", at(2024, 3, 15, 10, 0));
        assert_eq!(event.detail_path(), "/events/42/");

        event.url = Some("/events/talk-42/".into());
        assert_eq!(event.detail_path(), "/events/talk-42/");
    }
}
