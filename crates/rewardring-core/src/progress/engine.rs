//! Progress engine implementation.
//!
//! The engine is a tick-count-based state machine. It owns no timer; the
//! caller (normally [`crate::RewardProgressController`]) invokes `tick()`
//! once per interval.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> Paused -> Running
//!               |          |
//!               +----------+--> Stopped
//! ```
//!
//! ## Usage
//!
//! ```
//! use rewardring_core::{ProgressConfig, ProgressEngine};
//!
//! let mut engine = ProgressEngine::new(ProgressConfig::new(50, 0.5, 100.0)).unwrap();
//! engine.start();
//! for _ in 0..100 {
//!     engine.tick();
//! }
//! assert_eq!(engine.reward_value(), 100.5);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cycle::ProgressConfig;
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

/// Read-only snapshot handed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub run_state: RunState,
    /// Always in `[0, ticks_per_cycle)`.
    pub tick_count: u32,
    pub reward_value: f64,
    /// Set when a cycle completes, cleared near the end of the next one.
    pub just_incremented: bool,
}

/// Core progress engine.
#[derive(Debug, Clone)]
pub struct ProgressEngine {
    config: ProgressConfig,
    state: ProgressState,
}

impl ProgressEngine {
    /// Create a stopped engine holding `config.initial_value`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the configuration is unusable
    /// (zero interval, zero-length cycle, non-finite values).
    pub fn new(config: ProgressConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let state = ProgressState {
            run_state: RunState::Stopped,
            tick_count: 0,
            reward_value: config.initial_value,
            just_incremented: false,
        };
        Ok(Self { config, state })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state.run_state
    }

    pub fn tick_count(&self) -> u32 {
        self.state.tick_count
    }

    pub fn reward_value(&self) -> f64 {
        self.state.reward_value
    }

    pub fn just_incremented(&self) -> bool {
        self.state.just_incremented
    }

    pub fn snapshot(&self) -> ProgressState {
        self.state
    }

    /// 0.0 .. 1.0 progress within the current cycle.
    pub fn progress_fraction(&self) -> f64 {
        self.state.tick_count as f64 / self.config.ticks_per_cycle as f64
    }

    pub fn formatted_value(&self) -> String {
        self.config.format.format(self.state.reward_value)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let resumed = match self.state.run_state {
            RunState::Running => return None,
            RunState::Paused => true,
            RunState::Stopped => false,
        };
        self.state.run_state = RunState::Running;
        debug!(
            resumed,
            tick_count = self.state.tick_count,
            "progress started"
        );
        Some(Event::ProgressStarted {
            resumed,
            tick_count: self.state.tick_count,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state.run_state {
            RunState::Running => {
                self.state.run_state = RunState::Paused;
                debug!(tick_count = self.state.tick_count, "progress paused");
                Some(Event::ProgressPaused {
                    tick_count: self.state.tick_count,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn stop(&mut self) -> Option<Event> {
        match self.state.run_state {
            RunState::Running | RunState::Paused => {
                self.state.run_state = RunState::Stopped;
                self.state.tick_count = 0;
                debug!(reward_value = self.state.reward_value, "progress stopped");
                Some(Event::ProgressStopped {
                    reward_value: self.state.reward_value,
                    at: Utc::now(),
                })
            }
            RunState::Stopped => None,
        }
    }

    /// Advance one tick. Does nothing unless running.
    ///
    /// Returns, in order: `IndicatorHidden` (if the indicator was showing
    /// and the lead threshold was reached), `ValueChanged` (on cycle
    /// completion) and finally a `Tick` snapshot.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state.run_state != RunState::Running {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        let next = self.state.tick_count + 1;

        if next == self.config.popup_clear_tick() && self.state.just_incremented {
            self.state.just_incremented = false;
            events.push(Event::IndicatorHidden {
                tick_count: next,
                at: Utc::now(),
            });
        }

        if next >= self.config.ticks_per_cycle {
            self.state.tick_count = 0;
            self.state.just_incremented = true;
            self.state.reward_value += self.config.step_value;
            debug!(reward_value = self.state.reward_value, "cycle completed");
            events.push(Event::ValueChanged {
                value: self.state.reward_value,
                step: self.config.step_value,
                at: Utc::now(),
            });
        } else {
            self.state.tick_count = next;
        }

        events.push(Event::Tick {
            state: self.state,
            progress_fraction: self.progress_fraction(),
            at: Utc::now(),
        });
        events
    }
}
