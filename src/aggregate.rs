use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

use crate::parser::LogRecord;

/// How many entries the ranked lists keep.
pub const TOP_N: usize = 3;

/// Occurrence counter that remembers first-seen order, so equal counts rank
/// by whichever key showed up first.
#[derive(Debug, Default)]
struct OrderedCounter {
    index: HashMap<String, usize>,
    counts: Vec<(String, u64)>,
}

impl OrderedCounter {
    fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key.to_owned(), self.counts.len());
                self.counts.push((key.to_owned(), 1));
            }
        }
    }

    fn most_common(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.counts.clone();
        // stable: ties keep first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    fn into_counts(self) -> Vec<(String, u64)> {
        self.counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub earliest: DateTime<FixedOffset>,
    pub latest: DateTime<FixedOffset>,
}

/// Statistics over one file's matched lines. Built by [`Aggregator::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_requests: u64,
    /// Method -> count, first-seen order.
    pub method_counts: Vec<(String, u64)>,
    /// Busiest clients, count descending.
    pub top_ips: Vec<(String, u64)>,
    /// Slowest requests, duration descending.
    pub top_longest: Vec<LogRecord>,
    /// Range of the request times that parsed; `None` if none did.
    pub time_span: Option<TimeSpan>,
}

/// Per-file accumulator. Feed every matched record with [`push`], then call
/// [`finish`] once.
///
/// [`push`]: Aggregator::push
/// [`finish`]: Aggregator::finish
#[derive(Debug, Default)]
pub struct Aggregator {
    total_requests: u64,
    methods: OrderedCounter,
    ips: OrderedCounter,
    // whole file is kept; ranking happens once in finish()
    records: Vec<LogRecord>,
    time_span: Option<TimeSpan>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: LogRecord) {
        self.total_requests += 1;
        self.methods.add(&record.method);
        self.ips.add(&record.ip);
        if let Some(time) = record.time() {
            self.time_span = Some(match self.time_span {
                Some(span) => TimeSpan {
                    earliest: span.earliest.min(time),
                    latest: span.latest.max(time),
                },
                None => TimeSpan {
                    earliest: time,
                    latest: time,
                },
            });
        }
        self.records.push(record);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn finish(self) -> Summary {
        let top_ips = self.ips.most_common(TOP_N);

        let mut records = self.records;
        // sort_by_key is stable, equal durations stay in file order
        records.sort_by_key(|record| std::cmp::Reverse(record.duration));
        records.truncate(TOP_N);

        Summary {
            total_requests: self.total_requests,
            method_counts: self.methods.into_counts(),
            top_ips,
            top_longest: records,
            time_span: self.time_span,
        }
    }
}

impl FromIterator<LogRecord> for Summary {
    fn from_iter<I: IntoIterator<Item = LogRecord>>(iter: I) -> Self {
        let mut aggregator = Aggregator::new();
        for record in iter {
            aggregator.push(record);
        }
        aggregator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn record(ip: &str, method: &str, url: &str, duration: u64) -> LogRecord {
        LogRecord {
            ip: ip.to_string(),
            timestamp: "10/Oct/2023:13:55:36 +0000".to_string(),
            method: method.to_string(),
            url: url.to_string(),
            protocol: "HTTP/1.1".to_string(),
            status: 200,
            size: "512".to_string(),
            referer: "-".to_string(),
            agent: "test".to_string(),
            duration,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = Aggregator::new().finish();
        assert_eq!(summary.total_requests, 0);
        assert!(summary.method_counts.is_empty());
        assert!(summary.top_ips.is_empty());
        assert!(summary.top_longest.is_empty());
        assert!(summary.time_span.is_none());
    }

    #[test]
    fn test_top_longest_stable() {
        let summary: Summary = [50, 300, 10, 300, 20]
            .into_iter()
            .enumerate()
            .map(|(i, d)| record("10.0.0.1", "GET", &format!("/{i}"), d))
            .collect();

        let picked: Vec<_> = summary
            .top_longest
            .iter()
            .map(|r| (r.url.as_str(), r.duration))
            .collect();
        assert_eq!(picked, vec![("/1", 300), ("/3", 300), ("/0", 50)]);
        assert_eq!(summary.total_requests, 5);
    }

    #[test]
    fn test_short_lists_not_padded() {
        let summary: Summary = vec![
            record("10.0.0.1", "GET", "/a", 5),
            record("10.0.0.2", "POST", "/b", 9),
        ]
        .into_iter()
        .collect();
        assert_eq!(summary.top_longest.len(), 2);
        assert_eq!(summary.top_longest[0].url, "/b");
        assert_eq!(summary.top_ips.len(), 2);
    }

    #[test]
    fn test_top_ips_ranking_and_ties() {
        let ips = ["a", "b", "c", "b", "d", "c", "e", "e"];
        let summary: Summary = ips
            .iter()
            .map(|ip| record(ip, "GET", "/", 1))
            .collect();
        // b, c, e all have 2; first-seen order decides
        assert_eq!(
            summary.top_ips,
            vec![
                ("b".to_string(), 2),
                ("c".to_string(), 2),
                ("e".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_top_ips_true_counts() {
        let ips = ["x", "y", "y", "y", "z", "x", "w"];
        let summary: Summary = ips
            .iter()
            .map(|ip| record(ip, "GET", "/", 1))
            .collect();
        for (ip, count) in &summary.top_ips {
            let expected = ips.iter().filter(|i| **i == ip.as_str()).count() as u64;
            assert_eq!(*count, expected, "count for {ip}");
        }
        assert_eq!(summary.top_ips[0], ("y".to_string(), 3));
        assert_eq!(summary.top_ips[1], ("x".to_string(), 2));
        assert_eq!(summary.top_ips[2], ("z".to_string(), 1));
    }

    #[test]
    fn test_method_counts() {
        let summary: Summary = ["POST", "GET", "GET", "DELETE", "GET", "POST"]
            .iter()
            .map(|m| record("10.0.0.1", m, "/", 1))
            .collect();
        assert_eq!(
            summary.method_counts,
            vec![
                ("POST".to_string(), 2),
                ("GET".to_string(), 3),
                ("DELETE".to_string(), 1)
            ]
        );
        let sum: u64 = summary.method_counts.iter().map(|(_, c)| c).sum();
        assert_eq!(sum, summary.total_requests);
    }

    #[test]
    fn test_top_longest_sorted() {
        let durations = [7, 1, 99, 42, 42, 3, 100, 0];
        let summary: Summary = durations
            .iter()
            .map(|d| record("10.0.0.1", "GET", "/", *d))
            .collect();
        let picked: Vec<u64> = summary.top_longest.iter().map(|r| r.duration).collect();
        assert_eq!(picked, vec![100, 99, 42]);
    }

    #[test]
    fn test_time_span() {
        let mut aggregator = Aggregator::new();
        for ts in [
            "10/Oct/2023:13:55:36 +0000",
            "garbage",
            "10/Oct/2023:12:00:00 +0000",
            "10/Oct/2023:15:00:00 +0200",
        ] {
            let mut r = record("10.0.0.1", "GET", "/", 1);
            r.timestamp = ts.to_string();
            aggregator.push(r);
        }
        assert_eq!(aggregator.total_requests(), 4);
        let span = aggregator.finish().time_span.unwrap();
        assert_eq!(span.earliest.to_rfc3339(), "2023-10-10T12:00:00+00:00");
        assert_eq!(span.latest.to_rfc3339(), "2023-10-10T13:55:36+00:00");
    }
}
