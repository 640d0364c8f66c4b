//! CLI configuration file loading.

use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use waveclock_core::{DecoderSettings, Modulation};

/// TOML-file configuration; every field falls back to the decoder
/// defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub modulation: Modulation,
    pub rf_bandwidth: f32,
    pub threshold_db: f32,
    pub frequency_offset: f64,
}

impl Default for CliConfig {
    fn default() -> Self {
        let settings = DecoderSettings::default();
        Self {
            modulation: settings.modulation,
            rf_bandwidth: settings.rf_bandwidth,
            threshold_db: settings.threshold_db,
            frequency_offset: 0.0,
        }
    }
}

impl CliConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn decoder_settings(&self) -> DecoderSettings {
        DecoderSettings {
            modulation: self.modulation,
            rf_bandwidth: self.rf_bandwidth,
            threshold_db: self.threshold_db,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: CliConfig = toml::from_str("modulation = \"msf60\"").unwrap();
        assert_eq!(config.modulation, Modulation::Msf60);
        assert_eq!(config.rf_bandwidth, DecoderSettings::default().rf_bandwidth);
    }

    #[test]
    fn full_toml_round_trips() {
        let config = CliConfig {
            modulation: Modulation::Tdf,
            rf_bandwidth: 100.0,
            threshold_db: 3.0,
            frequency_offset: -250.0,
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.modulation, Modulation::Tdf);
        assert_eq!(parsed.frequency_offset, -250.0);
    }
}
