//! # Reward Ring Core Library
//!
//! This library provides the state machine behind a reward progress ring:
//! a periodic timer advances a tick counter, and every completed cycle adds
//! a fixed step to a displayed reward value. Rendering is left to whatever
//! layer consumes the events; the `rewardring-cli` binary is one such layer.
//!
//! ## Architecture
//!
//! - **Progress Engine**: A tick-count-based state machine with no timer of
//!   its own; `tick()` is invoked by the caller
//! - **Controller**: A tokio task that owns the engine and a single tick
//!   source, driven by fire-and-forget commands
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ProgressEngine`]: Core progress/reward state machine
//! - [`RewardProgressController`]: Timer-driven driver task
//! - [`ProgressCommands`]: start/stop/pause command surface
//! - [`Config`]: Application configuration management

pub mod controller;
pub mod error;
pub mod events;
pub mod progress;
pub mod storage;

pub use controller::{ControllerHandle, ProgressCommands, RewardProgressController};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use progress::{
    ProgressConfig, ProgressEngine, ProgressState, RewardFormat, RunState, SymbolPosition,
};
pub use storage::Config;
