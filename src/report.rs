use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::aggregate::Summary;

// Serialized as a JSON object, keys in slice order.
struct OrderedCounts<'a>(&'a [(String, u64)]);

impl Serialize for OrderedCounts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct SlowRequest<'a> {
    ip: &'a str,
    date: String,
    method: &'a str,
    url: &'a str,
    duration: u64,
}

#[derive(Serialize)]
struct Report<'a> {
    top_ips: OrderedCounts<'a>,
    top_longest: Vec<SlowRequest<'a>>,
    total_stat: OrderedCounts<'a>,
    total_requests: u64,
}

impl<'a> From<&'a Summary> for Report<'a> {
    fn from(summary: &'a Summary) -> Self {
        Report {
            top_ips: OrderedCounts(&summary.top_ips),
            top_longest: summary
                .top_longest
                .iter()
                .map(|record| SlowRequest {
                    ip: &record.ip,
                    date: format!("[{}]", record.timestamp),
                    method: &record.method,
                    url: &record.url,
                    duration: record.duration,
                })
                .collect(),
            total_stat: OrderedCounts(&summary.method_counts),
            total_requests: summary.total_requests,
        }
    }
}

/// Two-space indented JSON; non-ASCII text is written as-is.
pub fn to_json(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Report::from(summary))?)
}

/// `<stem>_<YYYYMMDD_HHMMSS>.json`, stem being the input name minus its last
/// extension.
pub fn report_file_name(input: &Path, now: DateTime<Local>) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}_{}.json", stem, now.format("%Y%m%d_%H%M%S"))
}

/// Write the report for `input` into `dir`, returning the new file's path.
pub fn save(summary: &Summary, input: &Path, dir: &Path) -> Result<PathBuf> {
    let out = dir.join(report_file_name(input, Local::now()));
    let json = to_json(summary)?;
    std::fs::write(&out, json).with_context(|| format!("write report {}", out.display()))?;
    Ok(out)
}
