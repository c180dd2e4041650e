use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::{ProgressState, RunState};

/// Every state change of a reward ring produces an Event.
/// The rendering layer subscribes to them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ProgressStarted {
        /// True when continuing from `Paused` rather than `Stopped`.
        resumed: bool,
        tick_count: u32,
        at: DateTime<Utc>,
    },
    ProgressPaused {
        tick_count: u32,
        at: DateTime<Utc>,
    },
    ProgressStopped {
        reward_value: f64,
        at: DateTime<Utc>,
    },
    /// Emitted after every tick that advanced progress.
    Tick {
        state: ProgressState,
        progress_fraction: f64,
        at: DateTime<Utc>,
    },
    /// The "+step" indicator should no longer be shown.
    IndicatorHidden {
        tick_count: u32,
        at: DateTime<Utc>,
    },
    /// A cycle completed and the reward value grew by one step.
    ValueChanged {
        value: f64,
        step: f64,
        at: DateTime<Utc>,
    },
    /// User activated the action button. Forwarded as-is.
    Tapped {
        run_state: RunState,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ProgressStarted { .. } => "progress_started",
            Event::ProgressPaused { .. } => "progress_paused",
            Event::ProgressStopped { .. } => "progress_stopped",
            Event::Tick { .. } => "tick",
            Event::IndicatorHidden { .. } => "indicator_hidden",
            Event::ValueChanged { .. } => "value_changed",
            Event::Tapped { .. } => "tapped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::ValueChanged {
            value: 100.5,
            step: 0.5,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ValueChanged");
        assert_eq!(json["value"], 100.5);
    }

    #[test]
    fn kind_matches_variant() {
        let event = Event::Tapped {
            run_state: RunState::Paused,
            at: Utc::now(),
        };
        assert_eq!(event.kind(), "tapped");
    }
}
