#![warn(missing_docs)]
//! Replay and test surfaces: JSONL event logs plus shared fixtures.

pub mod fixtures;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One line of an event log.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a, T: Serialize> {
    /// Position in the log, starting at 0.
    pub seq: u64,
    /// Wall-clock time the record was written.
    pub recorded_at: DateTime<Utc>,
    /// Short label, e.g. `"placements"`.
    pub kind: &'a str,
    /// Event payload.
    pub payload: &'a T,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    writer: BufWriter<File>,
    next_seq: u64,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create event log {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            next_seq: 0,
        })
    }

    /// Append a record and flush it. Returns its sequence number.
    pub fn write<T: Serialize>(&mut self, kind: &str, payload: &T) -> Result<u64> {
        let seq = self.next_seq;
        let record = EventRecord {
            seq,
            recorded_at: Utc::now(),
            kind,
            payload,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.next_seq += 1;
        Ok(seq)
    }
}

/// Read a JSONL file back as untyped values, skipping blank lines.
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<serde_json::Value>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("failed to open event log {}", path.display()))?;
    let mut values = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .with_context(|| format!("invalid JSON on line {} of {}", index + 1, path.display()))?;
        values.push(value);
    }
    Ok(values)
}
