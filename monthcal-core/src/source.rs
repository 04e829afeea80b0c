//! Where event records come from.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::config::MonthcalConfig;
use crate::error::{CalendarError, CalendarResult};
use crate::event::EventRecord;
use crate::month::CalendarMonth;

/// A source of event records for a month.
///
/// Sources may return records outside the month; bucketing drops whatever
/// falls outside the grid.
pub trait EventSource {
    fn fetch_month(
        &self,
        month: CalendarMonth,
    ) -> impl Future<Output = CalendarResult<Vec<EventRecord>>> + Send;
}

/// Events endpoint queried with `?year=YYYY&month=M` (1-based month).
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    http: reqwest::Client,
    events_url: Url,
}

impl HttpEventSource {
    pub fn new(events_url: Url, timeout: Duration) -> CalendarResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, events_url))
    }

    pub fn with_client(http: reqwest::Client, events_url: Url) -> Self {
        HttpEventSource { http, events_url }
    }

    pub fn from_config(config: &MonthcalConfig) -> CalendarResult<Self> {
        Self::new(config.events_url()?, config.request_timeout())
    }

    pub fn events_url(&self) -> &Url {
        &self.events_url
    }

    pub fn request_url(&self, month: CalendarMonth) -> Url {
        let mut url = self.events_url.clone();
        url.query_pairs_mut()
            .append_pair("year", &month.year().to_string())
            .append_pair("month", &month.number().to_string());
        url
    }
}

impl EventSource for HttpEventSource {
    async fn fetch_month(&self, month: CalendarMonth) -> CalendarResult<Vec<EventRecord>> {
        let url = self.request_url(month);
        debug!(%url, "Fetching events");

        let resp = self.http.get(url.clone()).send().await?;

        if !resp.status().is_success() {
            return Err(CalendarError::HttpStatus {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        EventRecord::parse_batch(&body)
    }
}

/// A local JSON file holding an array of event records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSource { path: path.into() }
    }
}

impl EventSource for JsonFileSource {
    async fn fetch_month(&self, month: CalendarMonth) -> CalendarResult<Vec<EventRecord>> {
        debug!(path = %self.path.display(), %month, "Reading events file");
        let body = tokio::fs::read_to_string(&self.path).await?;
        EventRecord::parse_batch(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_uses_one_based_month() {
        let source = HttpEventSource::new(
            Url::parse("http://localhost:8000/api/events/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();

        let january = CalendarMonth::new(2025, 0).unwrap();
        assert_eq!(
            source.request_url(january).as_str(),
            "http://localhost:8000/api/events/?year=2025&month=1"
        );
    }

    #[tokio::test]
    async fn test_json_file_source_reads_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "title": "Talk", "start": "2024-03-15T10:00:00"}]"#,
        )
        .unwrap();

        let source = JsonFileSource::new(&path);
        let records = source
            .fetch_month(CalendarMonth::new(2024, 2).unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Talk");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let source = JsonFileSource::new("/definitely/not/here.json");
        let result = source.fetch_month(CalendarMonth::new(2024, 2).unwrap()).await;
        assert!(matches!(result, Err(CalendarError::Io(_))));
    }
}
