//! Wall-clock timestamp for output file names, taken from public time
//! services so that files generated on machines with skewed clocks still sort
//! correctly. Falls back to the local clock.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// JSON with an RFC 3339 `datetime` field (worldtimeapi.org).
    WorldTimeApi,
    /// JSON with a naive UTC `dateTime` field (timeapi.io).
    TimeApiIo,
    /// Plain-text RFC 3339 body (timeapi.org).
    PlainText,
}

#[derive(Debug, Clone)]
pub struct TimeSource {
    pub url: String,
    pub format: TimeFormat,
}

pub fn default_sources() -> Vec<TimeSource> {
    vec![
        TimeSource {
            url: "http://worldtimeapi.org/api/timezone/UTC".into(),
            format: TimeFormat::WorldTimeApi,
        },
        TimeSource {
            url: "https://timeapi.io/api/Time/current/zone?timeZone=UTC".into(),
            format: TimeFormat::TimeApiIo,
        },
        TimeSource {
            url: "https://timeapi.org/utc/now".into(),
            format: TimeFormat::PlainText,
        },
    ]
}

pub fn parse_time(format: TimeFormat, body: &str) -> Result<DateTime<Utc>> {
    match format {
        TimeFormat::WorldTimeApi => {
            let v: serde_json::Value = serde_json::from_str(body)?;
            let s = v["datetime"].as_str().context("missing 'datetime'")?;
            Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
        }
        TimeFormat::TimeApiIo => {
            let v: serde_json::Value = serde_json::from_str(body)?;
            let s = v["dateTime"].as_str().context("missing 'dateTime'")?;
            let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")?;
            Ok(naive.and_utc())
        }
        TimeFormat::PlainText => {
            Ok(DateTime::parse_from_rfc3339(body.trim())?.with_timezone(&Utc))
        }
    }
}

pub struct TimeService {
    pub sources: Vec<TimeSource>,
    pub attempts: u32,
    pub pause: Duration,
    pub client: reqwest::Client,
}

impl Default for TimeService {
    fn default() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            sources: default_sources(),
            attempts: 3,
            pause: Duration::from_secs(1),
            client,
        }
    }
}

impl TimeService {
    async fn fetch(&self, source: &TimeSource) -> Result<DateTime<Utc>> {
        let resp = self.client.get(&source.url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("status {}", resp.status());
        }
        let body = resp.text().await?;
        parse_time(source.format, &body)
    }

    async fn try_source(&self, source: &TimeSource) -> Option<DateTime<Utc>> {
        for attempt in 1..=self.attempts {
            match self.fetch(source).await {
                Ok(dt) => return Some(dt),
                Err(e) => {
                    tracing::debug!(
                        event = "time_source_attempt_failed",
                        url = %source.url,
                        attempt,
                        error = %e
                    );
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.pause).await;
            }
        }
        None
    }

    /// Current UTC time from the first source that answers, else the local clock.
    pub async fn now(&self) -> DateTime<Utc> {
        for source in &self.sources {
            if let Some(dt) = self.try_source(source).await {
                return dt;
            }
            tracing::warn!(url = %source.url, "could not get time from source");
        }
        tracing::warn!("all online time sources failed, using local time");
        Utc::now()
    }
}

/// `YYYYmmdd_HHMM`, as used in generated file names.
pub fn file_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d_%H%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();

        let wt = r#"{"datetime":"2025-02-03T04:05:06.123456+00:00","timezone":"UTC"}"#;
        let got = parse_time(TimeFormat::WorldTimeApi, wt).unwrap();
        assert_eq!(file_stamp(&got), "20250203_0405");
        assert_eq!(got.timestamp(), expected.timestamp());

        let io = r#"{"year":2025,"dateTime":"2025-02-03T04:05:06.5570011"}"#;
        assert_eq!(
            parse_time(TimeFormat::TimeApiIo, io).unwrap().timestamp(),
            expected.timestamp()
        );

        let plain = "2025-02-03T04:05:06Z\n";
        assert_eq!(parse_time(TimeFormat::PlainText, plain).unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_time(TimeFormat::WorldTimeApi, "{}").is_err());
        assert!(parse_time(TimeFormat::PlainText, "yesterday").is_err());
    }

    #[tokio::test]
    async fn test_falls_back_to_local_clock() {
        let svc = TimeService {
            sources: vec![TimeSource {
                url: "http://127.0.0.1:9/unreachable".into(),
                format: TimeFormat::PlainText,
            }],
            attempts: 1,
            pause: Duration::ZERO,
            client: reqwest::Client::new(),
        };
        let before = Utc::now();
        let got = svc.now().await;
        assert!(got >= before);
    }
}
