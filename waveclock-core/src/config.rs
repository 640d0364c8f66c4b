//! Configuration types for the decoder pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::CANONICAL_SAMPLE_RATE;

/// Transmitter format to demodulate and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Modulation {
    /// German DCF77 on 77.5 kHz, amplitude OOK with -16.5 dB second markers
    #[default]
    Dcf77,
    /// French TDF on 162 kHz, carrier phase modulation
    Tdf,
    /// UK MSF on 60 kHz, OOK with dual A/B bits per second
    Msf60,
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modulation::Dcf77 => write!(f, "DCF77"),
            Modulation::Tdf => write!(f, "TDF"),
            Modulation::Msf60 => write!(f, "MSF60"),
        }
    }
}

impl FromStr for Modulation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dcf77" => Ok(Modulation::Dcf77),
            "tdf" => Ok(Modulation::Tdf),
            "msf60" | "msf" => Ok(Modulation::Msf60),
            _ => Err(ConfigError::UnknownModulation {
                name: s.to_string(),
            }),
        }
    }
}

/// Decoder settings, immutable between `apply_settings` calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderSettings {
    pub modulation: Modulation,
    /// RF bandwidth in Hz; the rate-converter anti-alias cutoff is
    /// `rf_bandwidth / 2.2`.
    pub rf_bandwidth: f32,
    /// OOK slicing threshold in dB below the long-term average power.
    pub threshold_db: f32,
    /// Scope tap signal selector for the real channel (0..7).
    pub scope_ch1: u8,
    /// Scope tap signal selector for the imaginary channel (0..7).
    pub scope_ch2: u8,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            modulation: Modulation::default(),
            rf_bandwidth: 200.0,
            threshold_db: 1.5,
            scope_ch1: 0,
            scope_ch2: 0,
        }
    }
}

impl DecoderSettings {
    /// Threshold as a linear power multiplier, `10^(-threshold_db / 10)`.
    pub fn linear_threshold(&self) -> f32 {
        10.0_f32.powf(-self.threshold_db / 10.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rf_bandwidth > 0.0) {
            return Err(ConfigError::InvalidBandwidth {
                bandwidth: self.rf_bandwidth,
            });
        }
        if !(self.threshold_db > 0.0) {
            return Err(ConfigError::InvalidThreshold {
                threshold_db: self.threshold_db,
            });
        }
        Ok(())
    }
}

/// Inbound channel parameters, set by the host front-end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Rate of the incoming IQ stream in Hz.
    pub sample_rate: u32,
    /// NCO shift applied before rate conversion, in Hz.
    pub frequency_offset: f64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            sample_rate: CANONICAL_SAMPLE_RATE,
            frequency_offset: 0.0,
        }
    }
}

impl ChannelSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }
        Ok(())
    }
}
