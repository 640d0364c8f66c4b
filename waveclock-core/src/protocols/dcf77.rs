//! German DCF77: carrier OOK, one power reduction per second of 100 ms
//! (logical 0) or 200 ms (logical 1). Second 59 omits the reduction and
//! so provides the minute marker.

use crate::report::{Reporter, StatusReport};
use crate::state::ClockState;
use crate::CANONICAL_SAMPLE_RATE as R;

use super::{check_second_marker, decode_cet_frame, finish_second};

/// Consume one canonical sample's sliced symbol.
pub(crate) fn step(state: &mut ClockState, data: i8, reporter: &Reporter) {
    state.data = data;

    // Look for minute marker - 59th second carrier is held high
    if state.data == 0 && state.prev_data == 1 {
        if state.high_count <= R * 2
            && state.high_count >= R * 16 / 10
            && state.low_count <= R * 3 / 10
            && state.low_count >= R / 10
        {
            if !state.got_minute_marker {
                reporter.status(StatusReport::GotMinuteMarker);
            }
            state.period_count = 0;
            state.second = 0;
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
            // No carrier = 1, carrier = 0
            state
                .time_code
                .set(state.second as usize, u8::from(state.data == 0));
            state.sample_marker = true;
        } else if state.period_count == 950 {
            finish_second(state, reporter, |s| decode_cet_frame(&s.time_code));
        } else if state.period_count == 1000 {
            state.period_count = 0;
        }
    }
    state.prev_data = state.data;
}
