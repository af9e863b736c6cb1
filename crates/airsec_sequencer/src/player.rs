// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence playback against the tokio clock.
//!
//! A [`SequencePlayer`] plays one [`Sequence`] at a time. `start` schedules
//! the run and returns immediately; a driver task then sleeps until each
//! stage's offset and fires every due stage in declared order.
//!
//! Firing and cancellation share a single state lock. Once `reset` returns,
//! the set of stages that will ever fire for that run is frozen, including
//! stages whose deadline had already passed but whose driver had not yet
//! taken the lock.

use crate::cursor::StageCursor;
use crate::effect::{EffectKey, EffectRegistry};
use crate::sequence::{Sequence, SequenceError};
use crate::sink::{StageActivation, StageSink};
use crate::stage::StageId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use uuid::Uuid;

/// Deadline used when an offset is too large to represent
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The sequence has no stages
    #[error("sequence has no stages to play")]
    EmptySequence,

    /// The sequence breaks ordering or uniqueness rules
    #[error("invalid sequence: {0}")]
    InvalidSequence(#[from] SequenceError),

    /// A run is already in progress
    #[error("a run is already in progress; reset it first")]
    AlreadyRunning,

    /// A stage references an effect that is not registered
    #[error("stage `{stage}` references unknown effect `{effect}`")]
    UnknownEffect {
        /// Offending stage
        stage: StageId,
        /// Missing effect key
        effect: EffectKey,
    },

    /// `start` was called outside a tokio runtime
    #[error("no tokio runtime available to schedule stages")]
    NoRuntime,

    /// Player configuration is unusable
    #[error("invalid player config: {0}")]
    InvalidConfig(String),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Nothing has been started
    #[default]
    Idle,
    /// Stages are being fired
    Running,
    /// The run was reset before its last stage
    Cancelled,
    /// Every stage fired
    Completed,
}

impl RunState {
    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    /// Whether a run ended, either way
    pub fn is_finished(&self) -> bool {
        matches!(self, RunState::Cancelled | RunState::Completed)
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Running => "Running",
            RunState::Cancelled => "Cancelled",
            RunState::Completed => "Completed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unique identifier for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playback settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Playback speed multiplier; 2.0 plays every offset in half the time
    pub speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl PlayerConfig {
    /// Check the speed is positive and finite
    pub fn validate(&self) -> Result<()> {
        if self.speed.is_finite() && self.speed > 0.0 {
            Ok(())
        } else {
            Err(PlayerError::InvalidConfig(format!(
                "speed must be positive and finite, got {}",
                self.speed
            )))
        }
    }

    /// Wall-clock delay before a stage at `offset` fires
    fn wall_delay(&self, offset: Duration) -> Duration {
        if self.speed == 1.0 {
            return offset;
        }
        Duration::try_from_secs_f64(offset.as_secs_f64() / self.speed).unwrap_or(FAR_FUTURE)
    }

    /// Sequence time reached after `elapsed` of wall-clock time
    fn sequence_time(&self, elapsed: Duration) -> Duration {
        if self.speed == 1.0 {
            return elapsed;
        }
        Duration::try_from_secs_f64(elapsed.as_secs_f64() * self.speed).unwrap_or(Duration::MAX)
    }
}

struct ActiveRun {
    id: RunId,
    task: Option<JoinHandle<()>>,
}

/// State guarded by the player lock
#[derive(Default)]
struct RunSlot {
    state: RunState,
    active: Option<ActiveRun>,
    last_run: Option<RunId>,
    fired: usize,
}

struct Shared {
    config: PlayerConfig,
    sink: Arc<dyn StageSink>,
    effects: EffectRegistry,
    slot: Mutex<RunSlot>,
    state_tx: watch::Sender<RunState>,
}

impl Shared {
    fn set_state(&self, slot: &mut RunSlot, state: RunState) {
        slot.state = state;
        self.state_tx.send_replace(state);
    }

    /// Cancel the active run, if any. Caller holds the lock.
    fn cancel_locked(&self, slot: &mut RunSlot) -> bool {
        let Some(active) = slot.active.take() else {
            return false;
        };
        if let Some(task) = active.task {
            task.abort();
        }
        self.set_state(slot, RunState::Cancelled);
        tracing::info!(run = %active.id, fired = slot.fired, "run cancelled");
        self.sink.run_finished(active.id, RunState::Cancelled);
        true
    }

    /// Fire every stage due at `target`. Returns false once the run is over.
    fn fire_due(
        &self,
        run: RunId,
        sequence: &Sequence,
        cursor: &mut StageCursor,
        target: Duration,
        elapsed: Duration,
    ) -> bool {
        let mut slot = self.slot.lock();
        if slot.active.as_ref().map(|a| a.id) != Some(run) {
            return false;
        }

        for index in cursor.advance(sequence, target) {
            let activation = StageActivation::new(run, sequence, index, elapsed);
            tracing::debug!(
                run = %run,
                stage = %activation.stage,
                label = %activation.label,
                ?elapsed,
                "stage activated"
            );
            self.effects.invoke(&activation);
            self.sink.stage_activated(&activation);
            slot.fired += 1;
        }

        if !cursor.is_finished(sequence) {
            return true;
        }

        slot.active = None;
        self.set_state(&mut slot, RunState::Completed);
        tracing::info!(run = %run, sequence = %sequence.name, ?elapsed, "run completed");
        self.sink.run_finished(run, RunState::Completed);
        false
    }
}

fn deadline(started: Instant, delay: Duration) -> Instant {
    started
        .checked_add(delay)
        .unwrap_or_else(|| started + FAR_FUTURE)
}

async fn drive(shared: Arc<Shared>, run: RunId, sequence: Arc<Sequence>, started: Instant) {
    let mut cursor = StageCursor::new();
    while let Some(offset) = cursor.next_offset(&sequence) {
        time::sleep_until(deadline(started, shared.config.wall_delay(offset))).await;
        let elapsed = started.elapsed();
        // never stall on rounding: the stage we slept for is always due
        let target = offset.max(shared.config.sequence_time(elapsed));
        if !shared.fire_due(run, &sequence, &mut cursor, target, elapsed) {
            break;
        }
    }
}

/// Plays sequences one run at a time.
///
/// Dropping the player cancels any run in progress.
pub struct SequencePlayer {
    shared: Arc<Shared>,
}

impl SequencePlayer {
    /// Create a player with default config and no effects
    pub fn new(sink: Arc<dyn StageSink>) -> Self {
        Self::build(sink, PlayerConfig::default(), EffectRegistry::new())
    }

    /// Create a player with explicit config and effects
    pub fn with_options(
        sink: Arc<dyn StageSink>,
        config: PlayerConfig,
        effects: EffectRegistry,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(sink, config, effects))
    }

    fn build(sink: Arc<dyn StageSink>, config: PlayerConfig, effects: EffectRegistry) -> Self {
        let (state_tx, _) = watch::channel(RunState::Idle);
        Self {
            shared: Arc::new(Shared {
                config,
                sink,
                effects,
                slot: Mutex::new(RunSlot::default()),
                state_tx,
            }),
        }
    }

    /// Start playing `sequence`.
    ///
    /// Fails with [`PlayerError::AlreadyRunning`] while a run is active;
    /// use [`restart`](Self::restart) to replace it.
    pub fn start(&self, sequence: impl Into<Arc<Sequence>>) -> Result<RunId> {
        self.launch(sequence.into(), false)
    }

    /// Cancel any active run and start `sequence` in one step
    pub fn restart(&self, sequence: impl Into<Arc<Sequence>>) -> Result<RunId> {
        self.launch(sequence.into(), true)
    }

    fn launch(&self, sequence: Arc<Sequence>, replace: bool) -> Result<RunId> {
        if sequence.is_empty() {
            tracing::warn!(sequence = %sequence.name, "refusing to start empty sequence");
            return Err(PlayerError::EmptySequence);
        }
        self.shared.effects.check(&sequence)?;
        let handle = Handle::try_current().map_err(|_| PlayerError::NoRuntime)?;

        let mut slot = self.shared.slot.lock();
        if slot.state.is_running() {
            if !replace {
                tracing::warn!(sequence = %sequence.name, "start rejected, run already active");
                return Err(PlayerError::AlreadyRunning);
            }
            self.shared.cancel_locked(&mut slot);
        }

        let run = RunId::new();
        let started = Instant::now();
        slot.fired = 0;
        slot.last_run = Some(run);
        slot.active = Some(ActiveRun {
            id: run,
            task: None,
        });
        self.shared.set_state(&mut slot, RunState::Running);
        tracing::info!(
            run = %run,
            sequence = %sequence.name,
            stages = sequence.len(),
            duration = ?sequence.total_duration(),
            "run started"
        );
        self.shared.sink.run_started(run, &sequence);

        // the driver blocks on the lock we hold, so it cannot fire before the handle is stored
        let task = handle.spawn(drive(Arc::clone(&self.shared), run, sequence, started));
        if let Some(active) = slot.active.as_mut() {
            active.task = Some(task);
        }
        Ok(run)
    }

    /// Cancel the active run. No-op unless a run is in progress.
    ///
    /// Returns the state after the call.
    pub fn reset(&self) -> RunState {
        let mut slot = self.shared.slot.lock();
        self.shared.cancel_locked(&mut slot);
        slot.state
    }

    /// Alias of [`reset`](Self::reset)
    pub fn cancel(&self) -> RunState {
        self.reset()
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.shared.slot.lock().state
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Stages fired by the current or most recent run
    pub fn fired(&self) -> usize {
        self.shared.slot.lock().fired
    }

    /// ID of the current or most recent run
    pub fn last_run(&self) -> Option<RunId> {
        self.shared.slot.lock().last_run
    }

    /// Playback settings
    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.shared.state_tx.subscribe()
    }

    /// Wait until no run is in progress and return the resulting state
    pub async fn wait(&self) -> RunState {
        let mut rx = self.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if !state.is_running() {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

impl Drop for SequencePlayer {
    fn drop(&mut self) {
        self.reset();
    }
}
