mod cycle;
mod engine;
mod format;

pub use cycle::{
    ProgressConfig, DEFAULT_POPUP_LEAD_TICKS, DEFAULT_TICKS_PER_CYCLE, DEFAULT_TICK_INTERVAL_MS,
};
pub use engine::{ProgressEngine, ProgressState, RunState};
pub use format::{RewardFormat, SymbolPosition};
