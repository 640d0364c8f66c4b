//! Outbound report messages and the best-effort queue they travel on.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use crossbeam::channel::Sender;

/// Decoder status, reported on transitions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusReport {
    LookingForMinuteMarker,
    GotMinuteMarker,
    DecodeOk,
    MinuteParity,
    HourParity,
    DataParity,
    HourMinuteParity,
    DayMonthParity,
}

impl StatusReport {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusReport::LookingForMinuteMarker => "Looking for minute marker",
            StatusReport::GotMinuteMarker => "Got minute marker",
            StatusReport::DecodeOk => "OK",
            StatusReport::MinuteParity => "Minute parity error",
            StatusReport::HourParity => "Hour parity error",
            StatusReport::DataParity => "Data parity error",
            StatusReport::HourMinuteParity => "Hour/minute parity error",
            StatusReport::DayMonthParity => "Day/month parity error",
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain value messages pushed to the report queue. The consumer owns a
/// message once pushed; nothing refers back into the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportMessage {
    Status(StatusReport),
    /// Emitted once per locked second. `None` until the first successful
    /// decode of a session.
    DateTime(Option<DateTime<FixedOffset>>),
}

/// Best-effort producer side of the report queue. Pushes never block and
/// a missing or disconnected queue is silently skipped.
#[derive(Debug, Clone, Default)]
pub(crate) struct Reporter {
    tx: Option<Sender<ReportMessage>>,
}

impl Reporter {
    pub fn set_queue(&mut self, tx: Option<Sender<ReportMessage>>) {
        self.tx = tx;
    }

    pub fn status(&self, status: StatusReport) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ReportMessage::Status(status));
        }
    }

    pub fn date_time(&self, date_time: Option<DateTime<FixedOffset>>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ReportMessage::DateTime(date_time));
        }
    }
}

/// Snapshot of the power level accumulators, reset on every pull.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelReport {
    /// Mean of `|sample|²` over the pulled interval.
    pub avg: f32,
    /// Peak of `|sample|²` over the pulled interval.
    pub peak: f32,
    /// Number of samples accumulated.
    pub count: u32,
}
