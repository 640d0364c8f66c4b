//! Runtime state shared by the three protocol state machines.

use chrono::{DateTime, Duration, FixedOffset};

use crate::timecode::TimeCode;

/// Mutable per-session state, owned by the decoder and touched only on
/// the single-threaded sample path.
#[derive(Debug, Clone)]
pub(crate) struct ClockState {
    /// Current slicer symbol: 0/1 for the OOK protocols, -1/0/+1 for TDF.
    pub data: i8,
    pub prev_data: i8,
    /// True for the one sample on which a timecode decision was taken.
    pub sample_marker: bool,
    /// Consecutive-sample run lengths used to measure marker geometry.
    pub low_count: u32,
    pub high_count: u32,
    pub zero_count: u32,
    /// Sample index within the current one-second period.
    pub period_count: u32,
    /// Second-of-minute index.
    pub second: u32,
    pub got_minute_marker: bool,
    /// Confirmed second-sync observations since lock.
    pub second_markers: u32,
    pub time_code: TimeCode,
    /// MSF60 B-bit stream.
    pub time_code_b: TimeCode,
    /// TDF per-second 4-phase observation buffer.
    pub bits: [i8; 4],
    /// Civil time, `None` until the first successful decode.
    pub date_time: Option<DateTime<FixedOffset>>,
}

impl ClockState {
    pub fn new() -> Self {
        Self {
            data: 0,
            prev_data: 0,
            sample_marker: false,
            low_count: 0,
            high_count: 0,
            zero_count: 0,
            period_count: 0,
            second: 0,
            got_minute_marker: false,
            second_markers: 0,
            time_code: TimeCode::new(),
            time_code_b: TimeCode::new(),
            bits: [0; 4],
            date_time: None,
        }
    }

    /// Drop the lock and restart the marker search, as after a
    /// modulation change.
    pub fn reset_lock(&mut self) {
        self.got_minute_marker = false;
        self.low_count = 0;
        self.high_count = 0;
        self.zero_count = 0;
        self.second = 0;
    }

    /// Dead-reckoning advance by one second.
    pub fn advance_date_time(&mut self) {
        self.date_time = self.date_time.map(|t| t + Duration::seconds(1));
    }
}
