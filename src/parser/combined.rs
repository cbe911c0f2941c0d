// parse combined log format with a trailing request duration:
// <ip> - - [<time>] "<method> <url> <protocol>" <status> <size> "<referer>" "<agent>" <duration>

use super::{LogParser, LogRecord};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static COMBINED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"^(?P<ip>\S+)\s+-\s+-\s+"#,
        r#"\[(?P<time>[^\]]+)\]\s+"#,
        r#""(?P<method>[^\s"]+)\s+(?P<url>[^\s"]+)\s+(?P<protocol>[^\s"]+)"\s+"#,
        r#"(?P<status>[0-9]+)\s+(?P<size>\S+)\s+"#,
        r#""(?P<referer>[^"]*)"\s+"(?P<agent>[^"]*)"\s+"#,
        r#"(?P<duration>[0-9]+)"#,
    ))
    .expect("combined log pattern is valid")
});

#[derive(Default)]
pub struct CombinedParser {}

fn field(caps: &Captures, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_string())
}

impl LogParser for CombinedParser {
    fn parse(&self, line: &str) -> Option<LogRecord> {
        let caps = COMBINED_RE.captures(line)?;
        // digit runs past u64::MAX count as a mismatch
        let status = caps.name("status")?.as_str().parse().ok()?;
        let duration = caps.name("duration")?.as_str().parse().ok()?;

        Some(LogRecord {
            ip: field(&caps, "ip")?,
            timestamp: field(&caps, "time")?,
            method: field(&caps, "method")?,
            url: field(&caps, "url")?,
            protocol: field(&caps, "protocol")?,
            status,
            size: field(&caps, "size")?,
            referer: field(&caps, "referer")?,
            agent: field(&caps, "agent")?,
            duration,
        })
    }
}
