//! UK MSF 60 kHz: every second opens with at least 100 ms of carrier
//! off, the 100-200 ms slot carries bit A and the 200-300 ms slot bit B.
//! The minute marker is a full 500 ms off followed by 500 ms on, so the
//! qualifying falling edge lands at the start of second 1.

use crate::report::{Reporter, StatusReport};
use crate::state::ClockState;
use crate::CANONICAL_SAMPLE_RATE as R;

use super::{check_second_marker, civil_time, finish_second};

/// Consume one canonical sample's sliced symbol.
pub(crate) fn step(state: &mut ClockState, data: i8, reporter: &Reporter) {
    state.data = data;

    // Look for minute marker - 500ms low, then 500ms high
    if state.data == 0 && state.prev_data == 1 {
        if state.high_count <= R * 3 / 5
            && state.high_count >= R * 2 / 5
            && state.low_count <= R * 3 / 5
            && state.low_count >= R * 2 / 5
        {
            if !state.got_minute_marker {
                reporter.status(StatusReport::GotMinuteMarker);
            }
            state.period_count = 0;
            state.second = 1;
            state.got_minute_marker = true;
            state.second_markers = 1;
        }
        state.low_count = 0;
    } else if state.data == 1 && state.prev_data == 0 {
        state.high_count = 0;
    } else if state.data == 1 {
        state.high_count += 1;
    } else {
        state.low_count += 1;
    }

    state.sample_marker = false;
    if state.got_minute_marker {
        state.period_count += 1;
        if state.period_count == 50 {
            check_second_marker(state, reporter);
            state.sample_marker = true;
        } else if state.period_count == 150 {
            // Bit A: no carrier = 1, carrier = 0
            state
                .time_code
                .set(state.second as usize, u8::from(state.data == 0));
            state.sample_marker = true;
        } else if state.period_count == 250 {
            // Bit B
            state
                .time_code_b
                .set(state.second as usize, u8::from(state.data == 0));
            state.sample_marker = true;
        } else if state.period_count == 950 {
            finish_second(state, reporter, decode_frame);
        } else if state.period_count == 1000 {
            state.period_count = 0;
        }
    }

    state.prev_data = state.data;
}

/// MSB-first BCD fields with odd parity carried in the B stream.
///
/// Later parity checks overwrite earlier ones, and the year check shares
/// the hour/minute text.
fn decode_frame(
    state: &ClockState,
) -> Result<Option<chrono::DateTime<chrono::FixedOffset>>, StatusReport> {
    let code = &state.time_code;
    let code_b = &state.time_code_b;

    let minute = code.bcd_msb(45, 51);
    let hour = code.bcd_msb(39, 44);
    let day = code.bcd_msb(30, 35);
    let month = code.bcd_msb(25, 29);
    let year = 2000 + code.bcd_msb(17, 24);

    let mut parity_error = None;
    if !code.odd_parity(39, 51, code_b.get(57)) {
        parity_error = Some(StatusReport::HourMinuteParity);
    }
    if !code.odd_parity(25, 35, code_b.get(55)) {
        parity_error = Some(StatusReport::DayMonthParity);
    }
    if !code.odd_parity(17, 24, code_b.get(54)) {
        parity_error = Some(StatusReport::HourMinuteParity);
    }
    if let Some(error) = parity_error {
        return Err(error);
    }

    // Bit 58B indicates BST rather than GMT
    let offset = if code_b.get(58) != 0 { 3600 } else { 0 };
    Ok(civil_time(year, month, day, hour, minute, offset))
}
