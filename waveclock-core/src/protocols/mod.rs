//! The three per-transmitter state machines.
//!
//! All variants share one skeleton: hunt the minute marker from the
//! slicer symbol stream, then count samples through each 1000-sample
//! second, take timecode decisions at fixed millisecond offsets, decode
//! the assembled frame at second 59 and wrap. The pieces that differ are
//! the marker geometry, the sampling offsets and the decode bit map.

pub(crate) mod dcf77;
pub(crate) mod msf60;
pub(crate) mod tdf;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::report::{Reporter, StatusReport};
use crate::state::ClockState;
use crate::timecode::TimeCode;

/// Second-sync bookkeeping at the 50 ms sampling point (OOK protocols):
/// the carrier should be in the low phase of the second marker.
pub(crate) fn check_second_marker(state: &mut ClockState, reporter: &Reporter) {
    state.second_markers += u32::from(state.data == 0);
    check_lock_quality(state, reporter);
}

/// Too many missed second markers means the signal is gone.
pub(crate) fn check_lock_quality(state: &mut ClockState, reporter: &Reporter) {
    if state.second > 10 && (state.second_markers as f32 / state.second as f32) < 0.7 {
        state.got_minute_marker = false;
        reporter.status(StatusReport::LookingForMinuteMarker);
    }
}

/// Decode the CET/CEST frame layout shared by DCF77 and TDF.
///
/// Later parity checks overwrite earlier ones, so the reported error is
/// the last failure in check order.
pub(crate) fn decode_cet_frame(
    code: &TimeCode,
) -> Result<Option<DateTime<FixedOffset>>, StatusReport> {
    let minute = code.bcd(21, 27);
    let hour = code.bcd(29, 34);
    let day = code.bcd(36, 41);
    let month = code.bcd(45, 49);
    let year = 2000 + code.bcd(50, 57);

    let mut parity_error = None;
    if !code.even_parity(21, 27, code.get(28)) {
        parity_error = Some(StatusReport::MinuteParity);
    }
    if !code.even_parity(29, 34, code.get(35)) {
        parity_error = Some(StatusReport::HourParity);
    }
    if !code.even_parity(36, 57, code.get(58)) {
        parity_error = Some(StatusReport::DataParity);
    }
    if let Some(error) = parity_error {
        return Err(error);
    }

    // Bit 17 indicates CEST rather than CET
    let offset = if code.get(17) != 0 { 2 * 3600 } else { 3600 };
    Ok(civil_time(year, month, day, hour, minute, offset))
}

/// Assemble a civil datetime; `None` when the decoded fields do not form
/// a real calendar instant.
pub(crate) fn civil_time(
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    offset_secs: i32,
) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    NaiveDate::from_ymd_opt(year as i32, month, day)?
        .and_hms_opt(hour, minute, 0)?
        .and_local_timezone(offset)
        .single()
}

/// The common 950 ms block: decode at second 59, otherwise advance the
/// second and the civil time, and report the per-second datetime.
pub(crate) fn finish_second(
    state: &mut ClockState,
    reporter: &Reporter,
    decode: impl FnOnce(&ClockState) -> Result<Option<DateTime<FixedOffset>>, StatusReport>,
) {
    if state.second == 59 {
        match decode(state) {
            Ok(date_time) => {
                state.date_time = date_time;
                reporter.status(StatusReport::DecodeOk);
            }
            Err(parity_error) => {
                state.advance_date_time();
                reporter.status(parity_error);
            }
        }
        state.second = 0;
    } else {
        state.second += 1;
        state.advance_date_time();
    }
    reporter.date_time(state.date_time);
}
