//! French TDF 162 kHz: phase modulation instead of OOK. Every second
//! except the 59th opens with a positive-then-negative phase excursion;
//! a repeat of the pattern in the following 100 ms encodes a 1 bit.
//! Second 59 carries no modulation at all and is the minute marker.

use crate::report::{Reporter, StatusReport};
use crate::state::ClockState;
use crate::CANONICAL_SAMPLE_RATE as R;

use super::{check_lock_quality, decode_cet_frame, finish_second};

/// Consume one canonical sample's ternary slicer symbol.
pub(crate) fn step(state: &mut ClockState, data: i8, reporter: &Reporter) {
    state.data = data;

    // Look for minute marker - 59th second is not phase modulated
    if state.data == 1 && state.prev_data == 0 {
        if state.zero_count <= R * 2 && state.zero_count >= R {
            if !state.got_minute_marker {
                reporter.status(StatusReport::GotMinuteMarker);
            }
            state.period_count = 0;
            state.second = 0;
            state.got_minute_marker = true;
            state.second_markers = 1;
        }
    } else if state.data == 0 && state.prev_data != 0 {
        state.zero_count = 0;
    } else if state.data == 0 {
        state.zero_count += 1;
    }

    state.sample_marker = false;
    if state.got_minute_marker {
        state.period_count += 1;
        match state.period_count {
            12 => {
                state.bits[0] = state.data;
                state.sample_marker = true;
            }
            62 => {
                state.bits[1] = state.data;
                state.sample_marker = true;
            }
            112 => {
                state.bits[2] = state.data;
                state.sample_marker = true;
            }
            162 => {
                state.bits[3] = state.data;
                state.sample_marker = true;

                // Check we got the second marker
                state.second_markers += u32::from(state.bits[0] == 1 && state.bits[1] == -1);
                check_lock_quality(state, reporter);

                // No phase modulation from 50 ms to 150 ms is a 0,
                // positive then negative is a 1
                if state.bits[2] == 0 && state.bits[3] == 0 {
                    state.time_code.set(state.second as usize, 0);
                } else if state.bits[2] == 1 && state.bits[3] == -1 {
                    state.time_code.set(state.second as usize, 1);
                }
            }
            950 => finish_second(state, reporter, |s| decode_cet_frame(&s.time_code)),
            1000 => state.period_count = 0,
            _ => {}
        }
    }
    state.prev_data = state.data;
}
