use std::time::Duration;

use clap::Args;
use rewardring_core::{
    Config, Event, ProgressCommands, ProgressConfig, ProgressEngine, ProgressState,
    RewardProgressController,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

#[derive(Args)]
pub struct RunArgs {
    /// Tick interval in milliseconds (overrides config)
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Reward added per completed cycle (overrides config)
    #[arg(long, allow_negative_numbers = true)]
    step: Option<f64>,
    /// Starting reward value (overrides config)
    #[arg(long, allow_negative_numbers = true)]
    initial: Option<f64>,
    /// Ticks per cycle (overrides config)
    #[arg(long)]
    ticks_per_cycle: Option<u32>,
    /// Ticks before cycle end at which the "+step" indicator hides (overrides config)
    #[arg(long)]
    popup_lead_ticks: Option<u32>,
    /// Stop after this many completed cycles
    #[arg(long, default_value = "1")]
    cycles: u32,
    /// Pause once after this many ticks, then resume
    #[arg(long, requires = "pause_ms")]
    pause_after_ticks: Option<u64>,
    /// How long the pause lasts, in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,
    /// Do not print per-tick events
    #[arg(long)]
    quiet_ticks: bool,
}

impl RunArgs {
    fn progress_config(
        &self,
        config: &Config,
    ) -> Result<ProgressConfig, Box<dyn std::error::Error>> {
        let mut config = config.clone();
        let p = &mut config.progress;
        if let Some(v) = self.interval_ms {
            p.tick_interval_ms = v;
        }
        if let Some(v) = self.step {
            p.step_value = v;
        }
        if let Some(v) = self.initial {
            p.initial_value = v;
        }
        if let Some(v) = self.ticks_per_cycle {
            p.ticks_per_cycle = v;
        }
        if let Some(v) = self.popup_lead_ticks {
            p.popup_lead_ticks = v;
        }
        Ok(config.progress_config()?)
    }
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn summary(state: &ProgressState, cfg: &ProgressConfig) -> serde_json::Value {
    serde_json::json!({
        "type": "Summary",
        "run_state": state.run_state,
        "tick_count": state.tick_count,
        "reward_value": state.reward_value,
        "formatted_value": cfg.format.format(state.reward_value),
    })
}

async fn drive(
    cfg: ProgressConfig,
    args: &RunArgs,
) -> Result<ProgressState, Box<dyn std::error::Error>> {
    let controller = RewardProgressController::spawn(cfg)?;
    let mut events = controller.subscribe();
    let mut pause_at = args.pause_after_ticks;
    let mut remaining = args.cycles;
    let mut ticks_seen: u64 = 0;

    controller.start();
    if remaining == 0 {
        controller.stop();
    }

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event output fell behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let is_tick = matches!(event, Event::Tick { .. });
        if !(is_tick && args.quiet_ticks) {
            print_event(&event)?;
        }

        match event {
            Event::Tick { .. } => {
                ticks_seen += 1;
                if pause_at == Some(ticks_seen) {
                    pause_at = None;
                    let pause = Duration::from_millis(args.pause_ms.unwrap_or_default());
                    debug!(ticks_seen, ?pause, "pausing ring");
                    controller.pause();
                    tokio::time::sleep(pause).await;
                    controller.start();
                }
            }
            Event::ValueChanged { .. } => {
                remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    controller.stop();
                }
            }
            Event::ProgressStopped { .. } => break,
            _ => {}
        }
    }

    let state = controller.snapshot();
    controller.shutdown().await;
    Ok(state)
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let cfg = args.progress_config(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let state = runtime.block_on(drive(cfg.clone(), &args))?;

    println!("{}", serde_json::to_string(&summary(&state, &cfg))?);
    Ok(())
}

pub fn status() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let engine = ProgressEngine::new(config.progress_config()?)?;
    let cfg = engine.config();
    let json = serde_json::json!({
        "state": engine.snapshot(),
        "progress_fraction": engine.progress_fraction(),
        "formatted_value": engine.formatted_value(),
        "step_indicator": cfg.format.format_step(cfg.step_value),
        "cycle_duration_ms": cfg.cycle_duration().as_millis() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
