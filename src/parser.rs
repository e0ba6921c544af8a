//! Filter log line parsing.
//!
//! Lines look like
//! `2024-01-15 10:30:45 [info] from=user@example.com ip=1.2.3.4 status=blocked score=15.5`.
//! Anything that does not fit is rejected with `None`; callers skip it.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) \[(\w+)\] (.+)$")
        .expect("log line pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Timestamp exactly as written in the log
    pub timestamp_raw: String,
    /// Timestamp in the log's local time
    pub timestamp: NaiveDateTime,
    pub level: String,
    pub message: String,
    pub fields: MessageFields,
}

impl LogEntry {
    pub fn is_debug(&self) -> bool {
        self.level.eq_ignore_ascii_case("debug")
    }
}

/// Recognized `key=value` tokens of a log message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageFields {
    pub from: Option<String>,
    pub ip: Option<String>,
    pub status: Option<String>,
    pub score: f64,
}

impl MessageFields {
    pub fn is_blocked(&self) -> bool {
        self.status.as_deref() == Some("blocked")
    }
}

pub fn parse_line(line: &str) -> Option<LogEntry> {
    let captures = LINE_PATTERN.captures(line.trim_end())?;
    let timestamp_raw = captures.get(1)?.as_str();
    let timestamp = NaiveDateTime::parse_from_str(timestamp_raw, TIMESTAMP_FORMAT).ok()?;
    let message = captures.get(3)?.as_str();

    Some(LogEntry {
        timestamp_raw: timestamp_raw.to_string(),
        timestamp,
        level: captures.get(2)?.as_str().to_string(),
        message: message.to_string(),
        fields: parse_message(message),
    })
}

/// Extract `from`, `ip`, `status` and `score` from a message.
///
/// The first occurrence of a key wins. Empty values count as absent. A score that
/// is missing, malformed or not finite is 0.
pub fn parse_message(message: &str) -> MessageFields {
    let mut fields = MessageFields::default();
    let mut score: Option<&str> = None;

    for (key, value) in message
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
    {
        if value.is_empty() {
            continue;
        }
        match key {
            "from" if fields.from.is_none() => fields.from = Some(value.to_string()),
            "ip" if fields.ip.is_none() => fields.ip = Some(value.to_string()),
            "status" if fields.status.is_none() => fields.status = Some(value.to_string()),
            "score" if score.is_none() => score = Some(value),
            _ => {}
        }
    }

    fields.score = score
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| s.is_finite())
        .unwrap_or(0.0);
    fields
}
