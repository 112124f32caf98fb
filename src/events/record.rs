//! Structured log records and their clock.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Severity label of a log record.
///
/// The set is open: unknown labels are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogType {
    Info,
    Success,
    Warning,
    Error,
    Other(String),
}

impl LogType {
    pub fn as_str(&self) -> &str {
        match self {
            LogType::Info => "Info",
            LogType::Success => "Success",
            LogType::Warning => "Warning",
            LogType::Error => "Error",
            LogType::Other(label) => label,
        }
    }
}

impl From<String> for LogType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Info" => LogType::Info,
            "Success" => LogType::Success,
            "Warning" => LogType::Warning,
            "Error" => LogType::Error,
            _ => LogType::Other(label),
        }
    }
}

impl From<&str> for LogType {
    fn from(label: &str) -> Self {
        LogType::from(label.to_string())
    }
}

impl From<LogType> for String {
    fn from(log_type: LogType) -> Self {
        match log_type {
            LogType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event as published to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(with = "iso8601_millis")]
    timestamp: DateTime<Utc>,
    log_type: LogType,
    url: String,
    correlation_id: String,
    application_name: String,
    message: String,
}

impl LogRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        log_type: LogType,
        url: impl Into<String>,
        correlation_id: impl Into<String>,
        application_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            log_type,
            url: url.into(),
            correlation_id: correlation_id.into(),
            application_name: application_name.into(),
            message: message.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn log_type(&self) -> &LogType {
        &self.log_type
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Wall clock that never goes backwards.
///
/// Readings are truncated to milliseconds, the precision they are published
/// with, and clamped to the previous reading.
#[derive(Debug)]
pub struct MonotonicClock {
    last: Mutex<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let reading = Utc::now().trunc_subsecs(3);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if reading > *last {
            *last = reading;
        }
        *last
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// `2024-01-02T03:04:05.678Z`
mod iso8601_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
