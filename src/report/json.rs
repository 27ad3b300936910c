// src/report/json.rs
//! JSON-lines reporting

use super::{Report, ReportSink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use tracing::warn;

#[derive(Serialize)]
struct Envelope<'a> {
    received_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a Report,
}

/// Writes each report as one JSON object per line, stamped with the time it
/// was reported.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_report(&mut self, report: &Report) -> crate::Result<()> {
        let envelope = Envelope {
            received_at: Utc::now(),
            report,
        };
        serde_json::to_writer(&mut self.writer, &envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn report(&mut self, report: Report) {
        if let Err(e) = self.write_report(&report) {
            warn!("failed to write report: {}", e);
        }
    }
}
