//! End-to-end decoding scenarios: synthesized baseband IQ driven through
//! the full pipeline at the canonical rate, observed via the report queue.

use chrono::{DateTime, Duration, FixedOffset};
use crossbeam::channel::{unbounded, Receiver};
use num_complex::Complex32;

use waveclock_core::generator;
use waveclock_core::{
    ClockDecoder, DecoderSettings, Modulation, ReportMessage, StatusReport,
};

fn decoder_with_queue(modulation: Modulation) -> (ClockDecoder, Receiver<ReportMessage>) {
    let mut decoder = ClockDecoder::new(DecoderSettings {
        modulation,
        ..Default::default()
    })
    .expect("default settings are valid");
    let (tx, rx) = unbounded();
    decoder.set_report_queue(Some(tx));
    (decoder, rx)
}

fn cet(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn statuses(messages: &[ReportMessage]) -> Vec<StatusReport> {
    messages
        .iter()
        .filter_map(|m| match m {
            ReportMessage::Status(s) => Some(*s),
            _ => None,
        })
        .collect()
}

fn date_times(messages: &[ReportMessage]) -> Vec<Option<DateTime<FixedOffset>>> {
    messages
        .iter()
        .filter_map(|m| match m {
            ReportMessage::DateTime(dt) => Some(*dt),
            _ => None,
        })
        .collect()
}

/// Index of the first message matching the predicate.
fn position(messages: &[ReportMessage], wanted: &ReportMessage) -> Option<usize> {
    messages.iter().position(|m| m == wanted)
}

#[test]
fn dcf77_cold_start_to_ok() {
    let (mut decoder, rx) = decoder_with_queue(Modulation::Dcf77);

    let start = cet("2024-12-31T13:41:00+01:00");
    let mut samples = generator::minutes(Modulation::Dcf77, &start, 2);
    // A short tail of the following minute covers the decode instant at
    // 950 ms into second 59
    let tail = generator::minutes(Modulation::Dcf77, &(start + Duration::minutes(2)), 1);
    samples.extend_from_slice(&tail[..500]);

    decoder.feed(&samples);
    let messages: Vec<_> = rx.try_iter().collect();

    let statuses = statuses(&messages);
    assert!(statuses.contains(&StatusReport::GotMinuteMarker));
    assert_eq!(statuses.last(), Some(&StatusReport::DecodeOk));

    let times = date_times(&messages);
    assert_eq!(times.len(), 60);
    assert_eq!(
        times.last().unwrap().unwrap().to_rfc3339(),
        "2024-12-31T13:42:00+01:00"
    );

    // No datetime reports during the marker search
    let lock = position(
        &messages,
        &ReportMessage::Status(StatusReport::GotMinuteMarker),
    )
    .unwrap();
    assert!(messages[..lock]
        .iter()
        .all(|m| !matches!(m, ReportMessage::DateTime(_))));

    assert!(decoder.locked());
}

#[test]
fn dcf77_parity_failure_dead_reckons() {
    let (mut decoder, rx) = decoder_with_queue(Modulation::Dcf77);

    let start = cet("2024-12-31T13:41:00+01:00");
    let mut samples = generator::minutes(Modulation::Dcf77, &start, 2);

    // Third minute with a corrupted minute-parity bit
    let mut code = generator::encode_dcf77(&cet("2024-12-31T13:43:00+01:00"));
    code.set(28, code.get(28) ^ 1);
    samples.extend_from_slice(&generator::dcf77_minute(&code));

    let tail = generator::minutes(Modulation::Dcf77, &(start + Duration::minutes(3)), 1);
    samples.extend_from_slice(&tail[..500]);

    decoder.feed(&samples);
    let messages: Vec<_> = rx.try_iter().collect();

    let statuses = statuses(&messages);
    assert!(statuses.contains(&StatusReport::DecodeOk));
    assert_eq!(statuses.last(), Some(&StatusReport::MinuteParity));

    // The corrupted frame is not adopted: the civil time advanced one
    // second at a time from the last good decode
    let times = date_times(&messages);
    assert_eq!(
        times.last().unwrap().unwrap().to_rfc3339(),
        "2024-12-31T13:43:00+01:00"
    );
    assert!(decoder.locked());
}

#[test]
fn msf60_bst_decode() {
    let (mut decoder, rx) = decoder_with_queue(Modulation::Msf60);

    let start = cet("2025-06-21T23:14:00+01:00");
    let mut samples = generator::minutes(Modulation::Msf60, &start, 2);
    let tail = generator::minutes(Modulation::Msf60, &(start + Duration::minutes(2)), 1);
    samples.extend_from_slice(&tail[..500]);

    decoder.feed(&samples);
    let messages: Vec<_> = rx.try_iter().collect();

    let statuses = statuses(&messages);
    assert!(statuses.contains(&StatusReport::GotMinuteMarker));
    assert_eq!(statuses.last(), Some(&StatusReport::DecodeOk));

    let times = date_times(&messages);
    assert_eq!(
        times.last().unwrap().unwrap().to_rfc3339(),
        "2025-06-21T23:15:00+01:00"
    );
}

#[test]
fn tdf_dropout_second_keeps_lock() {
    let (mut decoder, rx) = decoder_with_queue(Modulation::Tdf);

    let start = cet("2024-12-31T13:41:00+01:00");
    let mut samples = generator::minutes(Modulation::Tdf, &start, 1);

    // Second 30 of the observed minute carries no modulation at all
    let code = generator::encode_dcf77(&cet("2024-12-31T13:42:00+01:00"));
    samples.extend_from_slice(&generator::tdf_minute_with_dropout(&code, Some(30)));

    let tail = generator::minutes(Modulation::Tdf, &(start + Duration::minutes(2)), 1);
    samples.extend_from_slice(&tail[..500]);

    decoder.feed(&samples);
    let messages: Vec<_> = rx.try_iter().collect();

    // Exactly one status transition: the acquisition. The dropout neither
    // drops the lock nor re-reports the marker.
    assert_eq!(statuses(&messages), vec![StatusReport::GotMinuteMarker]);

    // The per-second reports keep flowing through the dropout
    let times = date_times(&messages);
    assert_eq!(times.len(), 60);
    assert!(decoder.locked());
}

#[test]
fn dcf77_lost_lock_stops_datetime_reports() {
    let (mut decoder, rx) = decoder_with_queue(Modulation::Dcf77);

    let start = cet("2024-12-31T13:41:00+01:00");
    let mut samples = generator::minutes(Modulation::Dcf77, &start, 1);
    // The opening of the next minute delivers the qualifying marker edge
    let next = generator::minutes(Modulation::Dcf77, &(start + Duration::minutes(1)), 1);
    samples.extend_from_slice(&next[..300]);
    // Then the modulation disappears: constant full carrier
    samples.extend_from_slice(&vec![Complex32::new(1.0, 0.0); 20_000]);

    decoder.feed(&samples);
    let messages: Vec<_> = rx.try_iter().collect();

    let statuses = statuses(&messages);
    assert!(statuses.contains(&StatusReport::GotMinuteMarker));
    assert_eq!(statuses.last(), Some(&StatusReport::LookingForMinuteMarker));

    // Eleven seconds elapse before the quality ratio trips
    let times = date_times(&messages);
    assert_eq!(times.len(), 11);

    // Nothing is reported after the lock is declared lost
    let lost = position(
        &messages,
        &ReportMessage::Status(StatusReport::LookingForMinuteMarker),
    )
    .unwrap();
    assert!(messages[lost + 1..]
        .iter()
        .all(|m| !matches!(m, ReportMessage::DateTime(_))));
    assert!(!decoder.locked());
}

#[test]
fn modulation_change_resets_lock() {
    let (mut decoder, rx) = decoder_with_queue(Modulation::Dcf77);

    let start = cet("2024-12-31T13:41:00+01:00");
    let mut samples = generator::minutes(Modulation::Dcf77, &start, 1);
    let next = generator::minutes(Modulation::Dcf77, &(start + Duration::minutes(1)), 1);
    samples.extend_from_slice(&next[..300]);

    decoder.feed(&samples);
    assert!(decoder.locked());

    let settings = DecoderSettings {
        modulation: Modulation::Msf60,
        ..decoder.settings().clone()
    };
    decoder.apply_settings(&settings, false).unwrap();
    assert!(!decoder.locked());

    // Keep feeding the old modulation: no lock, no datetime reports
    decoder.feed(&next[300..10_300]);

    let messages: Vec<_> = rx.try_iter().collect();
    let reset = position(
        &messages,
        &ReportMessage::Status(StatusReport::LookingForMinuteMarker),
    )
    .unwrap();
    assert!(messages[reset + 1..]
        .iter()
        .all(|m| !matches!(m, ReportMessage::DateTime(_))));
    assert!(!statuses(&messages[reset + 1..]).contains(&StatusReport::GotMinuteMarker));
    assert!(!decoder.locked());
}
