//! Baseband test-signal generation for the three transmitter formats.
//!
//! Encodes a civil datetime into the per-minute timecode layout (with
//! correct parity bits) and synthesizes one minute of canonical-rate IQ.
//! Used by the CLI simulation mode and the end-to-end tests.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use num_complex::Complex32;

use crate::config::Modulation;
use crate::timecode::TimeCode;
use crate::CANONICAL_SAMPLE_RATE;

const R: usize = CANONICAL_SAMPLE_RATE as usize;

/// DCF77 second markers reduce the carrier by 16.5 dB.
const DCF77_LOW_AMPLITUDE: f32 = 0.1496;

/// Encode the CET/CEST frame layout shared by DCF77 and TDF.
pub fn encode_dcf77(time: &DateTime<FixedOffset>) -> TimeCode {
    let mut code = TimeCode::new();
    // Start-of-time bit is always 1
    code.set(20, 1);
    if time.offset().local_minus_utc() == 2 * 3600 {
        code.set(17, 1);
    } else {
        code.set(18, 1);
    }
    set_bcd_lsb(&mut code, 21, 27, time.minute());
    code.set(28, code.xor_bits(21, 27));
    set_bcd_lsb(&mut code, 29, 34, time.hour());
    code.set(35, code.xor_bits(29, 34));
    set_bcd_lsb(&mut code, 36, 41, time.day());
    set_bcd_lsb(&mut code, 42, 44, time.weekday().number_from_monday());
    set_bcd_lsb(&mut code, 45, 49, time.month());
    set_bcd_lsb(&mut code, 50, 57, (time.year().rem_euclid(100)) as u32);
    code.set(58, code.xor_bits(36, 57));
    code
}

/// Encode the MSF60 A/B frame: MSB-first BCD fields, odd parity in the
/// B stream and the BST flag in bit 58B.
pub fn encode_msf60(time: &DateTime<FixedOffset>) -> (TimeCode, TimeCode) {
    let mut a = TimeCode::new();
    let mut b = TimeCode::new();
    set_bcd_msb(&mut a, 17, 24, (time.year().rem_euclid(100)) as u32);
    set_bcd_msb(&mut a, 25, 29, time.month());
    set_bcd_msb(&mut a, 30, 35, time.day());
    set_bcd_msb(&mut a, 36, 38, time.weekday().num_days_from_sunday());
    set_bcd_msb(&mut a, 39, 44, time.hour());
    set_bcd_msb(&mut a, 45, 51, time.minute());
    b.set(54, a.xor_bits(17, 24) ^ 1);
    b.set(55, a.xor_bits(25, 35) ^ 1);
    b.set(56, a.xor_bits(36, 38) ^ 1);
    b.set(57, a.xor_bits(39, 51) ^ 1);
    if time.offset().local_minus_utc() == 3600 {
        b.set(58, 1);
    }
    (a, b)
}

fn set_bcd_lsb(code: &mut TimeCode, first: usize, last: usize, value: u32) {
    let packed = (value % 10) | ((value / 10) << 4);
    for (idx, i) in (first..=last).enumerate() {
        code.set(i, ((packed >> idx) & 1) as u8);
    }
}

fn set_bcd_msb(code: &mut TimeCode, first: usize, last: usize, value: u32) {
    let packed = (value % 10) | ((value / 10) << 4);
    for (idx, i) in (first..=last).rev().enumerate() {
        code.set(i, ((packed >> idx) & 1) as u8);
    }
}

/// One minute of DCF77 OOK baseband: a 100 ms (bit 0) or 200 ms (bit 1)
/// power reduction at each second's start, omitted in second 59.
pub fn dcf77_minute(code: &TimeCode) -> Vec<Complex32> {
    let mut samples = Vec::with_capacity(60 * R);
    for second in 0..60 {
        let reduction = if second == 59 {
            0
        } else if code.get(second) != 0 {
            200
        } else {
            100
        };
        for ms in 0..R {
            let amplitude = if ms < reduction {
                DCF77_LOW_AMPLITUDE
            } else {
                1.0
            };
            samples.push(Complex32::new(amplitude, 0.0));
        }
    }
    samples
}

/// One minute of MSF60 OOK baseband: second 0 carries the 500 ms off /
/// 500 ms on minute marker; each following second is off for 100 ms,
/// then off again in the A and B slots for 1 bits.
pub fn msf60_minute(code_a: &TimeCode, code_b: &TimeCode) -> Vec<Complex32> {
    let mut samples = Vec::with_capacity(60 * R);
    for second in 0..60 {
        for ms in 0..R {
            let carrier_off = if second == 0 {
                ms < 500
            } else {
                ms < 100
                    || (ms < 200 && code_a.get(second) != 0)
                    || ((200..300).contains(&ms) && code_b.get(second) != 0)
            };
            let amplitude = if carrier_off { 0.0 } else { 1.0 };
            samples.push(Complex32::new(amplitude, 0.0));
        }
    }
    samples
}

/// One minute of TDF phase-modulated baseband. Each second except the
/// 59th opens with a +1 rad up/down phase excursion; a repeat of the
/// excursion in the following 100 ms encodes a 1 bit. Passing a dropout
/// second leaves that second entirely unmodulated.
pub fn tdf_minute_with_dropout(code: &TimeCode, dropout: Option<usize>) -> Vec<Complex32> {
    let mut samples = Vec::with_capacity(60 * R);
    for second in 0..60 {
        let silent = second == 59 || dropout == Some(second);
        for ms in 0..R {
            let phase = if silent {
                0.0
            } else if ms < 100 {
                pulse_phase(ms)
            } else if ms < 200 && code.get(second) != 0 {
                pulse_phase(ms - 100)
            } else {
                0.0
            };
            samples.push(Complex32::from_polar(1.0, phase));
        }
    }
    samples
}

pub fn tdf_minute(code: &TimeCode) -> Vec<Complex32> {
    tdf_minute_with_dropout(code, None)
}

/// Phase of the TDF excursion within its 100 ms window: a 25 ms ramp to
/// +1 rad, a 25 ms hold and a 25 ms ramp back.
fn pulse_phase(ms: usize) -> f32 {
    match ms {
        0..=24 => ms as f32 / 25.0,
        25..=49 => 1.0,
        50..=74 => 1.0 - (ms - 50) as f32 / 25.0,
        _ => 0.0,
    }
}

/// Synthesize consecutive whole minutes of the given format starting at
/// `start`.
pub fn minutes(modulation: Modulation, start: &DateTime<FixedOffset>, count: u32) -> Vec<Complex32> {
    let mut samples = Vec::with_capacity(count as usize * 60 * R);
    for i in 0..count {
        let minute = *start + chrono::Duration::minutes(i64::from(i));
        match modulation {
            Modulation::Dcf77 => samples.extend(dcf77_minute(&encode_dcf77(&minute))),
            Modulation::Tdf => samples.extend(tdf_minute(&encode_dcf77(&minute))),
            Modulation::Msf60 => {
                let (a, b) = encode_msf60(&minute);
                samples.extend(msf60_minute(&a, &b));
            }
        }
    }
    samples
}
