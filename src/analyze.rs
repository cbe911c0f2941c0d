use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::{
    aggregate::{Aggregator, Summary},
    parser::LogParser,
};

/// Directory entries are picked up only when their name contains this.
pub const ACCESS_LOG_MARKER: &str = "access.log";

/// What an input path resolves to.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    /// Files to analyse, in order.
    Files(Vec<PathBuf>),
    /// Neither a file nor a directory (or missing).
    Invalid,
}

fn is_access_log(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_string_lossy()
        .contains(ACCESS_LOG_MARKER)
        // follows symlinks; a dangling one is just not a file
        && entry.path().is_file()
}

/// Resolve the command-line path. A file is taken as-is, a directory is
/// scanned one level deep for `access.log` files.
pub fn resolve_input(path: &Path) -> Result<Input> {
    if path.is_file() {
        return Ok(Input::Files(vec![path.to_path_buf()]));
    }
    if !path.is_dir() {
        return Ok(Input::Invalid);
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("read directory {}", path.display()))?;
        if is_access_log(&entry) {
            files.push(entry.into_path());
        } else {
            tracing::debug!("Skipping {}", entry.path().display());
        }
    }
    Ok(Input::Files(files))
}

// Invalid UTF-8 sequences are dropped, not replaced.
fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Per-file outcome: the summary plus how many lines did not match.
#[derive(Debug)]
pub struct FileAnalysis {
    pub summary: Summary,
    pub skipped: u64,
}

pub fn analyze_reader<R: BufRead>(mut reader: R, parser: &dyn LogParser) -> Result<FileAnalysis> {
    let mut aggregator = Aggregator::new();
    let mut skipped = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = decode_lossy(&buf);
        match parser.parse(&line) {
            Some(record) => aggregator.push(record),
            None => {
                // the final newline of a file is not a skipped entry
                if !line.trim().is_empty() {
                    skipped += 1;
                }
            }
        }
    }

    Ok(FileAnalysis {
        summary: aggregator.finish(),
        skipped,
    })
}

pub fn analyze_file(path: &Path, parser: &dyn LogParser) -> Result<FileAnalysis> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    if let Ok(metadata) = file.metadata() {
        tracing::info!(
            "Analysing {} ({})",
            path.display(),
            humansize::format_size(metadata.len(), humansize::BINARY)
        );
    }
    let analysis = analyze_reader(BufReader::new(file), parser)
        .with_context(|| format!("read {}", path.display()))?;

    tracing::info!(
        "{}: {} requests, {} unrecognised lines",
        path.display(),
        analysis.summary.total_requests,
        analysis.skipped
    );
    if let Some(span) = &analysis.summary.time_span {
        tracing::debug!(
            "{}: requests from {} to {}",
            path.display(),
            span.earliest.to_rfc3339(),
            span.latest.to_rfc3339()
        );
    }
    Ok(analysis)
}
