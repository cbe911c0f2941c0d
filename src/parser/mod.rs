use chrono::{DateTime, FixedOffset, NaiveDateTime};

pub mod combined;

/// One access-log line that matched the full grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub ip: String,
    /// Text between `[` and `]`, brackets excluded.
    pub timestamp: String,
    pub method: String,
    pub url: String,
    pub protocol: String,
    pub status: u64,
    /// Kept as text: servers log `-` for empty bodies.
    pub size: String,
    pub referer: String,
    pub agent: String,
    pub duration: u64,
}

impl LogRecord {
    /// Parsed request time, if the timestamp is in CLF shape.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        clf_date_parse(&self.timestamp)
    }
}

pub trait LogParser {
    /// Returns `None` when the line does not match; callers skip it.
    fn parse(&self, line: &str) -> Option<LogRecord>;
}

// `10/Oct/2023:13:55:36 +0800`, zone optional (read as UTC when absent)
fn clf_date_parse(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, "%d/%b/%Y:%H:%M:%S %z")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%d/%b/%Y:%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc().fixed_offset())
        })
}
