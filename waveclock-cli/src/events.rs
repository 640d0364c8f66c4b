//! JSON-lines event log for machine consumption of decoder output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    Status { text: String },
    DateTime { value: Option<String> },
    Level { avg: f32, peak: f32, count: u32 },
}

#[derive(Serialize)]
struct Record<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a LogEvent,
}

/// Writes one JSON object per line; a log without a target path records
/// nothing.
pub struct EventLog {
    writer: Option<BufWriter<File>>,
}

impl EventLog {
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let writer = match path {
            Some(path) => Some(BufWriter::new(File::create(path).wrap_err_with(|| {
                format!("Failed to create event log at {}", path.display())
            })?)),
            None => None,
        };
        Ok(Self { writer })
    }

    pub fn record(&mut self, event: &LogEvent) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            let record = Record {
                timestamp: Utc::now(),
                event,
            };
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}
