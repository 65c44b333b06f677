//! Configuration for a conversion session.
//!
//! All session behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. The only knobs are the progress indicator's
//! cadence; converter behaviour (e.g. JPEG quality) is fixed by constants in
//! the pipeline modules.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::session::ConversionSession`].
///
/// # Example
/// ```rust
/// use file_converter::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .tick_interval_ms(50)
///     .progress_step(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.progress_ceiling, 90);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Interval between progress ticks in milliseconds. Default: 100.
    pub tick_interval_ms: u64,

    /// Progress units added on every tick. Default: 10.
    pub progress_step: u8,

    /// Highest value the ticker may report while the converter is still
    /// running. Must be below 100. Default: 90.
    ///
    /// Only a finished conversion moves progress to 100.
    pub progress_ceiling: u8,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            progress_step: 10,
            progress_ceiling: 90,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Progress after one more tick from `current`, never above the ceiling.
    pub fn next_progress(&self, current: u8) -> u8 {
        current
            .saturating_add(self.progress_step)
            .min(self.progress_ceiling)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn tick_interval_ms(mut self, ms: u64) -> Self {
        self.config.tick_interval_ms = ms;
        self
    }

    pub fn progress_step(mut self, step: u8) -> Self {
        self.config.progress_step = step;
        self
    }

    pub fn progress_ceiling(mut self, ceiling: u8) -> Self {
        self.config.progress_ceiling = ceiling;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.tick_interval_ms == 0 {
            return Err(ConvertError::InvalidConfig(
                "Tick interval must be ≥ 1 ms".into(),
            ));
        }
        if c.progress_step == 0 {
            return Err(ConvertError::InvalidConfig(
                "Progress step must be ≥ 1".into(),
            ));
        }
        if c.progress_ceiling >= 100 {
            return Err(ConvertError::InvalidConfig(format!(
                "Progress ceiling must be below 100, got {}",
                c.progress_ceiling
            )));
        }
        Ok(self.config)
    }
}
