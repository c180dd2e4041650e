//! Timer-driven controller for a reward ring.
//!
//! [`RewardProgressController::spawn`] starts one driver task that owns a
//! [`ProgressEngine`] and its tick source. Commands arrive over a channel,
//! so every state change is serialized through that task and no locking
//! is needed.
//!
//! - Running: the interval is polled and each firing ticks the engine.
//! - Paused: the interval is kept but not polled; resuming resets it so the
//!   next tick lands one full period later.
//! - Stopped: the interval is dropped.
//!
//! Dropping the controller aborts the driver task regardless of run state.

use std::future::pending;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::events::Event;
use crate::progress::{ProgressConfig, ProgressEngine, ProgressState, RunState};

/// Default broadcast capacity (events).
/// One cycle at the default length produces roughly 100 events.
pub const DEFAULT_EVENT_CAPACITY: usize = 1_024;

/// Fire-and-forget command surface of a reward ring.
pub trait ProgressCommands {
    fn start(&self);
    fn stop(&self);
    fn pause(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Stop,
    Pause,
    Tap,
    Shutdown,
}

/// Cloneable handle for issuing commands to a running controller.
///
/// Commands sent after the controller is torn down are dropped.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ControllerHandle {
    /// Forward a user activation of the action button.
    pub fn tap(&self) {
        self.send(Command::Tap);
    }

    /// True once the driver task has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!(?command, "controller torn down, command dropped");
        }
    }
}

impl ProgressCommands for ControllerHandle {
    fn start(&self) {
        self.send(Command::Start);
    }

    fn stop(&self) {
        self.send(Command::Stop);
    }

    fn pause(&self) {
        self.send(Command::Pause);
    }
}

/// Owns the driver task of one reward ring.
pub struct RewardProgressController {
    handle: ControllerHandle,
    events: broadcast::Sender<Event>,
    state: watch::Receiver<ProgressState>,
    config: ProgressConfig,
    task: Option<JoinHandle<()>>,
}

impl RewardProgressController {
    /// Validate `config` and spawn the driver task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the configuration is rejected.
    pub fn spawn(config: ProgressConfig) -> Result<Self, ValidationError> {
        Self::spawn_with_capacity(config, DEFAULT_EVENT_CAPACITY)
    }

    /// Like [`spawn`](Self::spawn) with an explicit event buffer size.
    /// Slow subscribers that fall further behind than this see a lag error.
    pub fn spawn_with_capacity(
        config: ProgressConfig,
        capacity: usize,
    ) -> Result<Self, ValidationError> {
        let engine = ProgressEngine::new(config.clone())?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        let (state_tx, state_rx) = watch::channel(engine.snapshot());

        let driver = Driver {
            engine,
            commands: cmd_rx,
            events: event_tx.clone(),
            state: state_tx,
            ticker: None,
        };
        let task = tokio::spawn(driver.run());
        info!(
            interval_ms = config.tick_interval_ms,
            ticks_per_cycle = config.ticks_per_cycle,
            step_value = config.step_value,
            "reward controller spawned"
        );

        Ok(Self {
            handle: ControllerHandle { tx: cmd_tx },
            events: event_tx,
            state: state_rx,
            config,
            task: Some(task),
        })
    }

    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Receiver of state snapshots, updated before the matching events
    /// are broadcast. The channel closes when the driver exits.
    pub fn state(&self) -> watch::Receiver<ProgressState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> ProgressState {
        *self.state.borrow()
    }

    pub fn tap(&self) {
        self.handle.tap();
    }

    /// Stop the driver task and wait for it to release the tick source.
    pub async fn shutdown(mut self) {
        self.handle.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "reward controller task ended abnormally");
            }
        }
        info!("reward controller shut down");
    }
}

impl ProgressCommands for RewardProgressController {
    fn start(&self) {
        self.handle.start();
    }

    fn stop(&self) {
        self.handle.stop();
    }

    fn pause(&self) {
        self.handle.pause();
    }
}

impl Drop for RewardProgressController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("reward controller dropped, driver aborted");
        }
    }
}

// ── Driver ───────────────────────────────────────────────────────────

struct Driver {
    engine: ProgressEngine,
    commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<Event>,
    state: watch::Sender<ProgressState>,
    /// Present while Running or Paused.
    ticker: Option<Interval>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            let running = self.engine.state() == RunState::Running;
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                _ = next_tick(self.ticker.as_mut(), running) => self.on_tick(),
            }
        }
        self.ticker = None;
        debug!(
            reward_value = self.engine.reward_value(),
            "reward controller driver exited"
        );
    }

    fn apply(&mut self, command: Command) {
        debug!(?command, state = ?self.engine.state(), "controller command");
        let event = match command {
            Command::Start => {
                let event = self.engine.start();
                if event.is_some() {
                    self.arm_ticker();
                }
                event
            }
            Command::Pause => self.engine.pause(),
            Command::Stop => {
                let event = self.engine.stop();
                if event.is_some() {
                    self.ticker = None;
                }
                event
            }
            Command::Tap => Some(Event::Tapped {
                run_state: self.engine.state(),
                at: Utc::now(),
            }),
            Command::Shutdown => None,
        };
        if let Some(event) = event {
            self.publish(vec![event]);
        }
    }

    fn on_tick(&mut self) {
        let events = self.engine.tick();
        if events.is_empty() {
            return;
        }
        self.publish(events);
    }

    fn arm_ticker(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => ticker.reset(),
            None => {
                let period = self.engine.config().tick_interval();
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
            }
        }
    }

    fn publish(&mut self, events: Vec<Event>) {
        self.state.send_replace(self.engine.snapshot());
        for event in events {
            if let Event::ValueChanged { value, .. } = event {
                info!(reward_value = value, "reward value increased");
            }
            debug!(event = event.kind(), "event published");
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }
}

async fn next_tick(ticker: Option<&mut Interval>, running: bool) {
    match ticker {
        Some(ticker) if running => {
            ticker.tick().await;
        }
        _ => pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scenario_config() -> ProgressConfig {
        ProgressConfig::new(50, 0.5, 100.0)
    }

    async fn next_value_change(events: &mut broadcast::Receiver<Event>) -> f64 {
        loop {
            if let Event::ValueChanged { value, .. } = events.recv().await.unwrap() {
                return value;
            }
        }
    }

    async fn collect_until_stopped(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut seen = Vec::new();
        loop {
            let event = events.recv().await.unwrap();
            let done = matches!(event, Event::ProgressStopped { .. });
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_cycle_emits_single_value_change() {
        let controller = RewardProgressController::spawn(scenario_config()).unwrap();
        let mut events = controller.subscribe();

        controller.start();
        assert_eq!(next_value_change(&mut events).await, 100.5);

        controller.stop();
        let rest = collect_until_stopped(&mut events).await;
        let late_changes = rest
            .iter()
            .filter(|e| matches!(e, Event::ValueChanged { .. }))
            .count();
        assert_eq!(late_changes, 0);

        let snap = controller.snapshot();
        assert_eq!(snap.run_state, RunState::Stopped);
        assert_eq!(snap.tick_count, 0);
        assert_eq!(snap.reward_value, 100.5);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_does_not_double_rate() {
        let cfg = scenario_config();
        let cycle = cfg.cycle_duration();
        let controller = RewardProgressController::spawn(cfg).unwrap();
        let mut events = controller.subscribe();

        let started = Instant::now();
        controller.start();
        controller.start();
        next_value_change(&mut events).await;
        assert!(started.elapsed() >= cycle);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_resume_keeps_progress() {
        let controller = RewardProgressController::spawn(scenario_config()).unwrap();
        let mut events = controller.subscribe();
        let mut state = controller.state();

        controller.start();
        state.wait_for(|s| s.tick_count == 50).await.unwrap();
        controller.pause();
        state
            .wait_for(|s| s.run_state == RunState::Paused)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(controller.snapshot().tick_count, 50);

        controller.start();
        state
            .wait_for(|s| s.run_state == RunState::Running)
            .await
            .unwrap();
        assert_eq!(controller.snapshot().tick_count, 50);

        let resumed_at = Instant::now();
        state.wait_for(|s| s.reward_value > 100.0).await.unwrap();
        assert!(resumed_at.elapsed() >= Duration::from_millis(50 * 50));
        controller.stop();

        // Everything since subscribing, both halves of the cycle included.
        let all = collect_until_stopped(&mut events).await;
        let changes: Vec<f64> = all
            .iter()
            .filter_map(|e| match e {
                Event::ValueChanged { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        let ticks = all
            .iter()
            .filter(|e| matches!(e, Event::Tick { .. }))
            .count();
        assert_eq!(changes, vec![100.5]);
        assert_eq!(ticks, 100);
        assert_eq!(controller.snapshot().reward_value, 100.5);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_then_start_restarts_from_zero() {
        let controller = RewardProgressController::spawn(scenario_config()).unwrap();
        let mut state = controller.state();

        controller.start();
        state.wait_for(|s| s.tick_count == 30).await.unwrap();
        controller.stop();
        state
            .wait_for(|s| s.run_state == RunState::Stopped)
            .await
            .unwrap();
        assert_eq!(controller.snapshot().tick_count, 0);

        controller.start();
        state.wait_for(|s| s.tick_count == 1).await.unwrap();
        assert_eq!(controller.snapshot().reward_value, 100.0);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn commands_while_stopped_are_ignored() {
        let controller = RewardProgressController::spawn(scenario_config()).unwrap();
        let mut events = controller.subscribe();

        controller.pause();
        controller.stop();
        controller.tap();

        // The tap is the first event, so pause/stop produced nothing.
        assert!(matches!(
            events.recv().await.unwrap(),
            Event::Tapped {
                run_state: RunState::Stopped,
                ..
            }
        ));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(controller.snapshot().run_state, RunState::Stopped);
        assert_eq!(controller.snapshot().tick_count, 0);
        controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn handle_drives_controller() {
        let controller = RewardProgressController::spawn(scenario_config()).unwrap();
        let handle = controller.handle();
        let mut state = controller.state();

        handle.start();
        state.wait_for(|s| s.tick_count == 5).await.unwrap();
        handle.pause();
        state
            .wait_for(|s| s.run_state == RunState::Paused)
            .await
            .unwrap();
        controller.shutdown().await;
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_tick_source() {
        let controller = RewardProgressController::spawn(scenario_config()).unwrap();
        let handle = controller.handle();
        let state = controller.state();

        controller.start();
        controller.shutdown().await;

        assert!(handle.is_closed());
        assert!(state.has_changed().is_err());
        // Late commands are dropped quietly.
        handle.start();
        handle.tap();
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_driver() {
        let controller = RewardProgressController::spawn(scenario_config()).unwrap();
        let handle = controller.handle();
        controller.start();
        drop(controller);

        for _ in 0..100 {
            if handle.is_closed() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let result = RewardProgressController::spawn(ProgressConfig::new(0, 0.5, 0.0));
        assert!(result.is_err());
    }
}
