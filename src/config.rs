//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! salat-config.toml file, and defines the immutable calculation input the
//! engine is keyed on. Location, calculation method, and display options all
//! live here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Calculation method for the event-time solver.
///
/// The variants map to the method ids the AlAdhan timings API understands;
/// `Custom` selects method 99 and sends the configured angles/interval as
/// `methodSettings` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Karachi,
    Isna,
    MuslimWorldLeague,
    UmmAlQura,
    Egyptian,
    Tehran,
    Gulf,
    Kuwait,
    Qatar,
    Singapore,
    France,
    Turkey,
    Russia,
    MoonsightingCommittee,
    Dubai,
    Custom,
}

impl CalculationMethod {
    /// Method id in the AlAdhan API's numbering.
    pub fn api_id(self) -> u8 {
        match self {
            CalculationMethod::Karachi => 1,
            CalculationMethod::Isna => 2,
            CalculationMethod::MuslimWorldLeague => 3,
            CalculationMethod::UmmAlQura => 4,
            CalculationMethod::Egyptian => 5,
            CalculationMethod::Tehran => 7,
            CalculationMethod::Gulf => 8,
            CalculationMethod::Kuwait => 9,
            CalculationMethod::Qatar => 10,
            CalculationMethod::Singapore => 11,
            CalculationMethod::France => 12,
            CalculationMethod::Turkey => 13,
            CalculationMethod::Russia => 14,
            CalculationMethod::MoonsightingCommittee => 15,
            CalculationMethod::Dubai => 16,
            CalculationMethod::Custom => 99,
        }
    }
}

/// Immutable input for one engine instance.
///
/// Identity (`PartialEq`) decides everything downstream: an unchanged config
/// keeps the source cache valid, a changed one discards the day buffer and
/// restarts indexing from zero.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalculationConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub method: CalculationMethod,
    /// Custom Fajr twilight angle in degrees (method `Custom` only).
    pub fajr_angle: Option<f64>,
    /// Custom Isha twilight angle in degrees (method `Custom` only).
    pub isha_angle: Option<f64>,
    /// Fixed Isha offset after Maghrib in minutes, instead of an angle.
    pub isha_interval: Option<u32>,
    /// IANA time zone name forwarded to the solver, e.g. `"Asia/Riyadh"`.
    /// Empty means "let the solver pick from the coordinates".
    pub time_zone: String,
}

impl CalculationConfig {
    /// Non-finite or out-of-range coordinates put the buffer in its empty
    /// Invalid state instead of being sent to a solver.
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Stable identity string used to key cached solver output. Any change
    /// to the config produces a different fingerprint and so invalidates
    /// every cached day at once.
    pub fn fingerprint(&self) -> String {
        format!(
            "{:.6},{:.6},{},{:?},{:?},{:?},{}",
            self.latitude,
            self.longitude,
            self.method.api_id(),
            self.fajr_angle,
            self.isha_angle,
            self.isha_interval,
            self.time_zone
        )
    }
}

/// Application configuration loaded from salat-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Location and calculation method
    pub location: LocationConfig,
    /// Terminal display options
    pub display: DisplayConfig,
}

/// Location and calculation-method configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Human-readable place name for reference
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub method: CalculationMethod,
    /// IANA time zone name, e.g. "Europe/London"
    pub time_zone: String,
    pub fajr_angle: Option<f64>,
    pub isha_angle: Option<f64>,
    pub isha_interval: Option<u32>,
}

/// Terminal display configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// How many Islamic days the sliding window keeps
    pub buffered_days: usize,
    /// Width of the ASCII day strip in columns
    pub strip_width: usize,
    /// Height of the ASCII sun-arc canvas in rows
    pub strip_height: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: LocationConfig {
                name: "Makkah".to_string(),
                latitude: 21.4225,
                longitude: 39.8262,
                method: CalculationMethod::UmmAlQura,
                time_zone: "Asia/Riyadh".to_string(),
                fajr_angle: None,
                isha_angle: None,
                isha_interval: None,
            },
            display: DisplayConfig {
                buffered_days: crate::buffer::MAX_BUFFERED_DAYS,
                strip_width: 72,
                strip_height: 12,
            },
        }
    }
}

impl Config {
    /// Load configuration from salat-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("salat-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(location = %config.location.name, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!("invalid config file format: {e}");
                    warn!("using default configuration (Makkah)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using default configuration (Makkah)");
                Self::default()
            }
        }
    }

    /// Save current configuration to salat-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("salat-config.toml", contents)?;
        info!("configuration saved to salat-config.toml");
        Ok(())
    }

    /// Assemble the engine's immutable calculation input from the location
    /// section.
    pub fn calculation(&self) -> CalculationConfig {
        CalculationConfig {
            latitude: self.location.latitude,
            longitude: self.location.longitude,
            method: self.location.method,
            fajr_angle: self.location.fajr_angle,
            isha_angle: self.location.isha_angle,
            isha_interval: self.location.isha_interval,
            time_zone: self.location.time_zone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.location.name, "Makkah");
        assert_eq!(config.location.method, CalculationMethod::UmmAlQura);
        assert_eq!(config.display.buffered_days, 3);
        assert!(config.calculation().has_valid_coordinates());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.location.name, parsed.location.name);
        assert_eq!(config.calculation(), parsed.calculation());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.location.name, "Makkah");
    }

    #[test]
    fn method_ids_match_api_numbering() {
        assert_eq!(CalculationMethod::MuslimWorldLeague.api_id(), 3);
        assert_eq!(CalculationMethod::UmmAlQura.api_id(), 4);
        assert_eq!(CalculationMethod::Custom.api_id(), 99);
    }

    #[test]
    fn fingerprint_tracks_identity() {
        let a = Config::default().calculation();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.method = CalculationMethod::Isna;
        assert_ne!(a.fingerprint(), b.fingerprint());

        let mut c = a.clone();
        c.latitude += 0.5;
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn non_finite_coordinates_are_invalid() {
        let mut cfg = Config::default().calculation();
        cfg.latitude = f64::NAN;
        assert!(!cfg.has_valid_coordinates());
        cfg.latitude = 21.4;
        cfg.longitude = f64::INFINITY;
        assert!(!cfg.has_valid_coordinates());
    }

    #[test]
    fn out_of_range_coordinates_are_invalid() {
        let mut cfg = Config::default().calculation();
        cfg.latitude = 91.0;
        assert!(!cfg.has_valid_coordinates());
        cfg.latitude = 21.4;
        cfg.longitude = -180.5;
        assert!(!cfg.has_valid_coordinates());
    }
}
