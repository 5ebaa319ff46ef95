//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! reference behavior.
//!
//! ```
//! use slot_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     [finder]
//!     slot_count = 5
//!     timezone = "America/Chicago"
//!
//!     [availability]
//!     lookahead_days = 7
//! "#).unwrap();
//!
//! assert_eq!(config.finder.slot_count, 5);
//! assert_eq!(config.finder.base_score, 10);
//! assert_eq!(config.availability.lookahead_days, 7);
//! ```

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraints::DurationPolicy;

/// Smallest batch the finder may produce.
pub const MIN_SLOT_COUNT: usize = 3;
/// Largest batch the finder may produce.
pub const MAX_SLOT_COUNT: usize = 5;

/// Justifications cycled through by candidate index.
pub const DEFAULT_REASONS: [&str; 6] = [
    "Both calendars clear.",
    "Fits your afternoon preference.",
    "Back-to-back with your morning standup.",
    "Earliest available slot.",
    "Optimal time for both timezones.",
    "Avoids your busy Friday block.",
];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub finder: FinderConfig,
    pub availability: AvailabilityConfig,
}

impl EngineConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, isn't valid TOML, or holds
    /// out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.finder.validate()?;
        self.availability.validate()
    }
}

/// Settings for [`crate::SlotFinder`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Slots per batch, within `MIN_SLOT_COUNT..=MAX_SLOT_COUNT`.
    pub slot_count: usize,
    /// Score of the first slot; each later slot scores one less.
    pub base_score: i64,
    pub reasons: Vec<String>,
    /// Used when a request gives no duration.
    pub default_duration_minutes: i64,
    pub duration_policy: DurationPolicy,
    /// Apply `endDate` and `excludedDays` during generation.
    pub enforce_bounds: bool,
    /// IANA timezone that hours and weekdays are evaluated in.
    pub timezone: String,
    /// Draw count, day jitter and hour from a seeded stream instead of the index.
    pub seed: Option<u64>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            slot_count: 4,
            base_score: 10,
            reasons: DEFAULT_REASONS.iter().map(|r| r.to_string()).collect(),
            default_duration_minutes: 60,
            duration_policy: DurationPolicy::default(),
            enforce_bounds: false,
            timezone: "UTC".to_string(),
            seed: None,
        }
    }
}

impl FinderConfig {
    /// The configured timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone '{}'", self.timezone)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SLOT_COUNT..=MAX_SLOT_COUNT).contains(&self.slot_count) {
            return Err(ConfigError::Invalid(format!(
                "slot_count must be between {} and {}, got {}",
                MIN_SLOT_COUNT, MAX_SLOT_COUNT, self.slot_count
            )));
        }
        if self.reasons.is_empty() {
            return Err(ConfigError::Invalid("reasons must not be empty".to_string()));
        }
        if self.default_duration_minutes <= 0 {
            return Err(ConfigError::Invalid(format!(
                "default_duration_minutes must be positive, got {}",
                self.default_duration_minutes
            )));
        }
        self.tz().map(|_| ())
    }
}

/// Settings for [`crate::availability::FreeBusyAvailability`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    /// How many days past the search start to look for free time.
    pub lookahead_days: u32,
    pub workday_start_hour: u32,
    /// Exclusive; a slot must end by this hour.
    pub workday_end_hour: u32,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 5,
            workday_start_hour: 9,
            workday_end_hour: 17,
        }
    }
}

impl AvailabilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookahead_days == 0 {
            return Err(ConfigError::Invalid(
                "lookahead_days must be at least 1".to_string(),
            ));
        }
        if self.workday_end_hour > 24 || self.workday_start_hour >= self.workday_end_hour {
            return Err(ConfigError::Invalid(format!(
                "workday hours must satisfy start < end <= 24, got {}..{}",
                self.workday_start_hour, self.workday_end_hour
            )));
        }
        Ok(())
    }
}
