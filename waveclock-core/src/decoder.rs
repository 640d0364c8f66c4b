//! The decoder sink: frequency translation, rate conversion, power
//! estimation, symbol slicing and protocol dispatch.

use std::f32::consts::PI;

use crossbeam::channel::Sender;
use num_complex::Complex32;

use crate::config::{ChannelSettings, DecoderSettings, Modulation};
use crate::dsp::{Interpolator, MovingAverage, Nco, PhaseDiscriminator};
use crate::errors::Result;
use crate::protocols;
use crate::report::{LevelReport, ReportMessage, Reporter, StatusReport};
use crate::scope::ScopeSink;
use crate::state::ClockState;
use crate::CANONICAL_SAMPLE_RATE;

/// Window of the instantaneous power average, in canonical samples.
const MAGSQ_WINDOW: usize = 32;
/// Window of the long-term threshold reference.
const THRESHOLD_WINDOW: usize = 10 * CANONICAL_SAMPLE_RATE as usize;
/// Smoothing window for the TDF phase discriminator output.
const FM_DEMOD_WINDOW: usize = 8;

/// Radio time-signal decoder.
///
/// Feed it baseband IQ at the configured channel rate; it reports the
/// decoded civil time once per second and status changes on an optional
/// outbound queue. The sample path is single-threaded and allocation-free
/// in steady state.
pub struct ClockDecoder {
    settings: DecoderSettings,
    channel: ChannelSettings,
    linear_threshold: f32,

    nco: Nco,
    interpolator: Interpolator,
    interpolator_distance: f32,
    interpolator_distance_remain: f32,

    magsq_avg: MovingAverage,
    threshold_avg: MovingAverage,
    magsq: f32,
    threshold: f32,
    magsq_sum: f64,
    magsq_peak: f32,
    magsq_count: u32,

    phase_discri: PhaseDiscriminator,
    fm_demod_avg: MovingAverage,

    state: ClockState,
    reporter: Reporter,
    scope: Option<Box<dyn ScopeSink>>,
}

impl ClockDecoder {
    pub fn new(settings: DecoderSettings) -> Result<Self> {
        let channel = ChannelSettings::default();
        let defaults = DecoderSettings::default();
        let cutoff = f64::from(defaults.rf_bandwidth) / 2.2;

        let fm_scaling = CANONICAL_SAMPLE_RATE as f32 / (2.0 * 20.0 / PI);

        let mut decoder = Self {
            settings: defaults,
            channel,
            linear_threshold: 1.0,
            nco: Nco::new(),
            interpolator: Interpolator::new(f64::from(channel.sample_rate), cutoff)?,
            interpolator_distance: 1.0,
            interpolator_distance_remain: 1.0,
            magsq_avg: MovingAverage::new(MAGSQ_WINDOW),
            threshold_avg: MovingAverage::new(THRESHOLD_WINDOW),
            magsq: 0.0,
            threshold: 0.0,
            magsq_sum: 0.0,
            magsq_peak: 0.0,
            magsq_count: 0,
            phase_discri: PhaseDiscriminator::new(fm_scaling),
            fm_demod_avg: MovingAverage::new(FM_DEMOD_WINDOW),
            state: ClockState::new(),
            reporter: Reporter::default(),
            scope: None,
        };
        decoder.apply_settings(&settings, true)?;
        decoder.apply_channel_settings(&ChannelSettings::default(), true)?;
        Ok(decoder)
    }

    pub fn new_with_defaults() -> Result<Self> {
        Self::new(DecoderSettings::default())
    }

    /// Install or remove the outbound report queue.
    pub fn set_report_queue(&mut self, tx: Option<Sender<ReportMessage>>) {
        self.reporter.set_queue(tx);
    }

    /// Install or remove the diagnostic scope tap.
    pub fn set_scope_sink(&mut self, sink: Option<Box<dyn ScopeSink>>) {
        self.scope = sink;
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    pub fn channel_settings(&self) -> &ChannelSettings {
        &self.channel
    }

    /// True while the minute marker is being tracked.
    pub fn locked(&self) -> bool {
        self.state.got_minute_marker
    }

    /// Current civil time, `None` until the first successful decode.
    pub fn date_time(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        self.state.date_time
    }

    /// Pull the level-meter accumulators, resetting them.
    pub fn take_level_report(&mut self) -> LevelReport {
        let report = LevelReport {
            avg: if self.magsq_count > 0 {
                (self.magsq_sum / f64::from(self.magsq_count)) as f32
            } else {
                0.0
            },
            peak: self.magsq_peak,
            count: self.magsq_count,
        };
        self.magsq_sum = 0.0;
        self.magsq_peak = 0.0;
        self.magsq_count = 0;
        report
    }

    /// Consume a buffer of IQ samples at the channel rate.
    pub fn feed(&mut self, samples: &[Complex32]) {
        let mut ci = Complex32::new(0.0, 0.0);
        for &sample in samples {
            let c = sample * self.nco.next_iq();

            if self.interpolator_distance < 1.0 {
                // interpolate
                while !self
                    .interpolator
                    .interpolate(&mut self.interpolator_distance_remain, c, &mut ci)
                {
                    self.process_one_sample(ci);
                    self.interpolator_distance_remain += self.interpolator_distance;
                }
            } else {
                // decimate
                if self
                    .interpolator
                    .decimate(&mut self.interpolator_distance_remain, c, &mut ci)
                {
                    self.process_one_sample(ci);
                    self.interpolator_distance_remain += self.interpolator_distance;
                }
            }
        }
    }

    /// One canonical-rate sample: power estimation, slicing, protocol
    /// step and the scope tap.
    fn process_one_sample(&mut self, ci: Complex32) {
        let magsq = ci.re * ci.re + ci.im * ci.im;
        self.magsq_avg.feed(magsq);
        self.threshold_avg.feed(magsq);
        self.magsq = self.magsq_avg.value();
        self.magsq_sum += f64::from(magsq);
        if magsq > self.magsq_peak {
            self.magsq_peak = magsq;
        }
        self.magsq_count += 1;

        match self.settings.modulation {
            Modulation::Dcf77 => {
                let data = self.slice_ook();
                protocols::dcf77::step(&mut self.state, data, &self.reporter);
            }
            Modulation::Tdf => {
                let data = self.slice_phase(ci);
                protocols::tdf::step(&mut self.state, data, &self.reporter);
            }
            Modulation::Msf60 => {
                let data = self.slice_ook();
                protocols::msf60::step(&mut self.state, data, &self.reporter);
            }
        }

        if self.scope.is_some() {
            let tap = Complex32::new(
                self.tap_value(self.settings.scope_ch1, ci.re, magsq),
                self.tap_value(self.settings.scope_ch2, ci.im, magsq),
            );
            if let Some(scope) = self.scope.as_deref_mut() {
                scope.push(tap);
            }
        }
    }

    /// OOK slicer: carrier present while the short power average exceeds
    /// the adaptive threshold.
    fn slice_ook(&mut self) -> i8 {
        self.threshold = self.threshold_avg.value() * self.linear_threshold;
        i8::from(self.magsq > self.threshold)
    }

    /// TDF ternary phase slicer over the smoothed discriminator output.
    fn slice_phase(&mut self, ci: Complex32) -> i8 {
        let fm_demod = self.phase_discri.phase_delta(ci);
        self.fm_demod_avg.feed(fm_demod);
        let avg = self.fm_demod_avg.value();
        if avg >= 0.5 {
            1
        } else if avg <= -0.5 {
            -1
        } else {
            0
        }
    }

    /// Scope tap signal selection. Magnitude-class signals are scaled for
    /// display; 0 and out-of-range selectors fall back to the raw input.
    fn tap_value(&self, selector: u8, raw: f32, magsq: f32) -> f32 {
        match selector {
            1 => magsq * 1e6,
            2 => self.magsq * 1e6,
            3 => self.threshold * 1e6,
            4 => self.fm_demod_avg.value(),
            5 => f32::from(self.state.data),
            6 => f32::from(u8::from(self.state.sample_marker)),
            7 => f32::from(u8::from(self.state.got_minute_marker)),
            _ => raw,
        }
    }

    /// Reconfigure the NCO and rate converter. Applied between buffers,
    /// never mid-buffer; the distance accumulator is reset.
    pub fn apply_channel_settings(&mut self, settings: &ChannelSettings, force: bool) -> Result<()> {
        settings.validate()?;

        if settings.frequency_offset != self.channel.frequency_offset
            || settings.sample_rate != self.channel.sample_rate
            || force
        {
            self.nco
                .set_freq(-settings.frequency_offset, f64::from(settings.sample_rate));
        }

        if settings.sample_rate != self.channel.sample_rate || force {
            self.interpolator = Interpolator::new(
                f64::from(settings.sample_rate),
                f64::from(self.settings.rf_bandwidth) / 2.2,
            )?;
            self.interpolator_distance =
                settings.sample_rate as f32 / CANONICAL_SAMPLE_RATE as f32;
            self.interpolator_distance_remain = self.interpolator_distance;
        }

        self.channel = *settings;
        Ok(())
    }

    /// Update modulation, bandwidth and threshold. A modulation change
    /// drops the lock and restarts the marker search.
    pub fn apply_settings(&mut self, settings: &DecoderSettings, force: bool) -> Result<()> {
        settings.validate()?;

        if settings.rf_bandwidth != self.settings.rf_bandwidth || force {
            self.interpolator = Interpolator::new(
                f64::from(self.channel.sample_rate),
                f64::from(settings.rf_bandwidth) / 2.2,
            )?;
            self.interpolator_distance =
                self.channel.sample_rate as f32 / CANONICAL_SAMPLE_RATE as f32;
            self.interpolator_distance_remain = self.interpolator_distance;
        }

        if settings.threshold_db != self.settings.threshold_db || force {
            self.linear_threshold = settings.linear_threshold();
        }

        if settings.modulation != self.settings.modulation || force {
            self.state.reset_lock();
            self.reporter.status(StatusReport::LookingForMinuteMarker);
        }

        self.settings = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn new_applies_settings() {
        let decoder = ClockDecoder::new(DecoderSettings {
            modulation: Modulation::Msf60,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(decoder.settings().modulation, Modulation::Msf60);
        assert!(!decoder.locked());
        assert_eq!(decoder.date_time(), None);
    }

    #[test]
    fn modulation_change_emits_search_status() {
        let mut decoder = ClockDecoder::new_with_defaults().unwrap();
        let (tx, rx) = unbounded();
        decoder.set_report_queue(Some(tx));

        let settings = DecoderSettings {
            modulation: Modulation::Tdf,
            ..decoder.settings().clone()
        };
        decoder.apply_settings(&settings, false).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            ReportMessage::Status(StatusReport::LookingForMinuteMarker)
        );

        // No change, no force: silent
        decoder.apply_settings(&settings, false).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut decoder = ClockDecoder::new_with_defaults().unwrap();
        let mut settings = decoder.settings().clone();
        settings.threshold_db = 0.0;
        assert!(decoder.apply_settings(&settings, false).is_err());

        // Bandwidth whose cutoff sits above Nyquist for the channel rate
        let mut settings = decoder.settings().clone();
        settings.rf_bandwidth = 2000.0;
        assert!(decoder.apply_settings(&settings, false).is_err());
    }

    #[test]
    fn level_report_pull_resets() {
        let mut decoder = ClockDecoder::new_with_defaults().unwrap();
        let samples = vec![Complex32::new(0.5, 0.0); 100];
        decoder.feed(&samples);

        let report = decoder.take_level_report();
        assert_eq!(report.count, 100);
        assert!(report.peak > 0.0);
        assert!(report.avg > 0.0);

        let empty = decoder.take_level_report();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.peak, 0.0);
    }

    #[test]
    fn scope_tap_receives_one_sample_per_canonical_sample() {
        use std::sync::{Arc, Mutex};

        struct SharedSink(Arc<Mutex<Vec<Complex32>>>);
        impl ScopeSink for SharedSink {
            fn push(&mut self, sample: Complex32) {
                self.0.lock().unwrap().push(sample);
            }
        }

        let captured = Arc::new(Mutex::new(Vec::new()));
        let mut decoder = ClockDecoder::new_with_defaults().unwrap();
        decoder.set_scope_sink(Some(Box::new(SharedSink(Arc::clone(&captured)))));

        let samples = vec![Complex32::new(1.0, 0.0); 250];
        decoder.feed(&samples);
        // Unity rate conversion: one tap sample per input sample, channel
        // 1 carrying the raw I input
        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 250);
        assert!(captured.last().unwrap().re > 0.9);
    }

    #[test]
    fn force_reapply_is_idempotent() {
        let mut decoder = ClockDecoder::new_with_defaults().unwrap();
        let settings = decoder.settings().clone();
        decoder.apply_settings(&settings, true).unwrap();
        decoder.apply_settings(&settings, true).unwrap();
        assert_eq!(decoder.settings(), &settings);
        assert!(!decoder.locked());
        assert_eq!(decoder.interpolator_distance, 1.0);
        assert_eq!(decoder.interpolator_distance_remain, 1.0);
    }
}
