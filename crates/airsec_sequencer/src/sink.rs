// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage notification sinks.
//!
//! A sink is the view/audio side of playback. The player guarantees:
//! - at most one `stage_activated` per stage per run, in offset order
//! - nothing after `reset()`/`cancel()` returns
//! - exactly one `run_finished` per run
//!
//! Sinks are called while the player holds its state lock and must not
//! call back into the same player.

use crate::effect::EffectKey;
use crate::player::{RunId, RunState};
use crate::sequence::Sequence;
use crate::stage::StageId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Notification emitted when a stage becomes active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageActivation {
    /// Run the stage belongs to
    pub run: RunId,
    /// Name of the sequence being played
    pub sequence: String,
    /// Position of the stage in its sequence
    pub index: usize,
    /// Stage ID
    pub stage: StageId,
    /// Stage label
    pub label: String,
    /// Effect key, if the stage has one
    pub effect: Option<EffectKey>,
    /// Scheduled offset from run start
    pub offset: Duration,
    /// Actual time since run start when the stage fired
    pub elapsed: Duration,
}

impl StageActivation {
    pub(crate) fn new(run: RunId, sequence: &Sequence, index: usize, elapsed: Duration) -> Self {
        let stage = &sequence.stages()[index];
        Self {
            run,
            sequence: sequence.name.clone(),
            index,
            stage: stage.id.clone(),
            label: stage.label.clone(),
            effect: stage.effect.clone(),
            offset: stage.offset,
            elapsed,
        }
    }
}

/// Receiver of playback progress
pub trait StageSink: Send + Sync {
    /// A run was accepted and scheduled
    fn run_started(&self, _run: RunId, _sequence: &Sequence) {}

    /// A stage became active
    fn stage_activated(&self, activation: &StageActivation);

    /// A run reached `Completed` or `Cancelled`
    fn run_finished(&self, _run: RunId, _outcome: RunState) {}
}

impl<S: StageSink + ?Sized> StageSink for Arc<S> {
    fn run_started(&self, run: RunId, sequence: &Sequence) {
        (**self).run_started(run, sequence);
    }

    fn stage_activated(&self, activation: &StageActivation) {
        (**self).stage_activated(activation);
    }

    fn run_finished(&self, run: RunId, outcome: RunState) {
        (**self).run_finished(run, outcome);
    }
}

/// Sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StageSink for NullSink {
    fn stage_activated(&self, _activation: &StageActivation) {}
}

#[derive(Debug, Default)]
struct Recording {
    started: Vec<RunId>,
    activations: Vec<StageActivation>,
    outcomes: Vec<(RunId, RunState)>,
}

/// Sink that keeps every notification, for headless playback and tests
#[derive(Debug, Default)]
pub struct RecordingSink {
    recording: Mutex<Recording>,
}

impl RecordingSink {
    /// Create an empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs that were started, oldest first
    pub fn started(&self) -> Vec<RunId> {
        self.recording.lock().started.clone()
    }

    /// Every activation so far
    pub fn activations(&self) -> Vec<StageActivation> {
        self.recording.lock().activations.clone()
    }

    /// Labels of every activation so far
    pub fn labels(&self) -> Vec<String> {
        self.recording
            .lock()
            .activations
            .iter()
            .map(|a| a.label.clone())
            .collect()
    }

    /// Terminal outcomes, oldest first
    pub fn outcomes(&self) -> Vec<(RunId, RunState)> {
        self.recording.lock().outcomes.clone()
    }

    /// Number of activations so far
    pub fn len(&self) -> usize {
        self.recording.lock().activations.len()
    }

    /// Whether no stage has activated
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        *self.recording.lock() = Recording::default();
    }
}

impl StageSink for RecordingSink {
    fn run_started(&self, run: RunId, _sequence: &Sequence) {
        self.recording.lock().started.push(run);
    }

    fn stage_activated(&self, activation: &StageActivation) {
        self.recording.lock().activations.push(activation.clone());
    }

    fn run_finished(&self, run: RunId, outcome: RunState) {
        self.recording.lock().outcomes.push((run, outcome));
    }
}

/// Sink forwarding to several sinks in registration order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn StageSink>>,
}

impl FanoutSink {
    /// Create an empty fan-out
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a downstream sink
    pub fn with(mut self, sink: Arc<dyn StageSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of downstream sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no downstream sinks
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl StageSink for FanoutSink {
    fn run_started(&self, run: RunId, sequence: &Sequence) {
        for sink in &self.sinks {
            sink.run_started(run, sequence);
        }
    }

    fn stage_activated(&self, activation: &StageActivation) {
        for sink in &self.sinks {
            sink.stage_activated(activation);
        }
    }

    fn run_finished(&self, run: RunId, outcome: RunState) {
        for sink in &self.sinks {
            sink.run_finished(run, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    fn activation(run: RunId, label: &str) -> StageActivation {
        let sequence =
            Sequence::from_stages("demo", [Stage::at_millis("only", label, 0)]).unwrap();
        StageActivation::new(run, &sequence, 0, Duration::ZERO)
    }

    #[test]
    fn test_fanout_forwards_in_order() {
        let first = Arc::new(RecordingSink::new());
        let second = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new().with(first.clone()).with(second.clone());
        let run = RunId::new();

        fanout.stage_activated(&activation(run, "Badge tapped"));
        fanout.run_finished(run, RunState::Completed);

        assert_eq!(fanout.len(), 2);
        for sink in [&first, &second] {
            assert_eq!(sink.labels(), vec!["Badge tapped".to_string()]);
            assert_eq!(sink.outcomes(), vec![(run, RunState::Completed)]);
        }
    }

    #[test]
    fn test_recording_clear() {
        let sink = RecordingSink::new();
        sink.stage_activated(&activation(RunId::new(), "x"));
        assert_eq!(sink.len(), 1);
        sink.clear();
        assert!(sink.is_empty());
    }
}
