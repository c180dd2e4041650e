use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::format::RewardFormat;
use crate::error::ValidationError;

pub const DEFAULT_TICKS_PER_CYCLE: u32 = 100;
pub const DEFAULT_POPUP_LEAD_TICKS: u32 = 15;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Immutable parameters of a reward ring.
///
/// Build with [`ProgressConfig::new`] or the builder-style setters, then
/// call [`ProgressConfig::validate`] (the engine does this on construction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Period of the tick source in milliseconds.
    pub tick_interval_ms: u64,
    /// Ticks that make up one full ring.
    pub ticks_per_cycle: u32,
    /// Amount added to the reward value per completed cycle.
    pub step_value: f64,
    pub initial_value: f64,
    /// The "+step" indicator is hidden this many ticks before cycle end.
    pub popup_lead_ticks: u32,
    #[serde(default)]
    pub format: RewardFormat,
}

impl ProgressConfig {
    pub fn new(tick_interval_ms: u64, step_value: f64, initial_value: f64) -> Self {
        Self {
            tick_interval_ms,
            ticks_per_cycle: DEFAULT_TICKS_PER_CYCLE,
            step_value,
            initial_value,
            popup_lead_ticks: DEFAULT_POPUP_LEAD_TICKS,
            format: RewardFormat::default(),
        }
    }

    pub fn with_ticks_per_cycle(mut self, ticks: u32) -> Self {
        self.ticks_per_cycle = ticks;
        self
    }

    pub fn with_popup_lead_ticks(mut self, ticks: u32) -> Self {
        self.popup_lead_ticks = ticks;
        self
    }

    pub fn with_format(mut self, format: RewardFormat) -> Self {
        self.format = format;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Wall-clock length of one full cycle.
    pub fn cycle_duration(&self) -> Duration {
        self.tick_interval().saturating_mul(self.ticks_per_cycle)
    }

    /// Tick count at which the indicator from the previous cycle is hidden.
    pub fn popup_clear_tick(&self) -> u32 {
        self.ticks_per_cycle.saturating_sub(self.popup_lead_ticks)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tick_interval_ms == 0 {
            return Err(ValidationError::invalid(
                "tick_interval_ms",
                "must be greater than 0",
            ));
        }
        if self.ticks_per_cycle == 0 {
            return Err(ValidationError::invalid(
                "ticks_per_cycle",
                "must be greater than 0",
            ));
        }
        if self.popup_lead_ticks == 0 {
            return Err(ValidationError::invalid(
                "popup_lead_ticks",
                "must be greater than 0",
            ));
        }
        if self.popup_lead_ticks >= self.ticks_per_cycle {
            return Err(ValidationError::invalid(
                "popup_lead_ticks",
                format!(
                    "must be less than ticks_per_cycle ({})",
                    self.ticks_per_cycle
                ),
            ));
        }
        if !self.step_value.is_finite() {
            return Err(ValidationError::invalid("step_value", "must be finite"));
        }
        if !self.initial_value.is_finite() {
            return Err(ValidationError::invalid("initial_value", "must be finite"));
        }
        Ok(())
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL_MS, 1.0, 0.0)
    }
}
