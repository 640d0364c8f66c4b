//! Waveclock core library
//!
//! Demodulates and decodes longwave time signals from a baseband complex
//! IQ stream. Three transmitter formats are supported: DCF77 (Germany,
//! amplitude OOK), TDF (France, carrier phase modulation) and MSF60
//! (United Kingdom, OOK with dual A/B bits per second). The pipeline
//! rate-converts arbitrary input rates to a canonical 1 kHz internal
//! rate, slices per-protocol symbols, hunts the once-per-minute frame
//! marker and reports the decoded civil date/time once per second.

pub mod channel;
pub mod config;
pub mod decoder;
pub mod dsp;
pub mod errors;
pub mod generator;
pub mod report;
pub mod scope;
pub mod timecode;

mod protocols;
mod state;

// Re-export the canonical decoder interface
pub use config::{ChannelSettings, DecoderSettings, Modulation};
pub use decoder::ClockDecoder;
pub use errors::{ConfigError, DspError, WaveclockError};
pub use report::{LevelReport, ReportMessage, StatusReport};
pub use scope::ScopeSink;

/// Canonical internal sample rate: one second of signal is exactly 1000
/// samples, so millisecond offsets within a second are integer indices.
pub const CANONICAL_SAMPLE_RATE: u32 = 1000;
