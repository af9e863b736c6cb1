// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio cues driven by playback.
//!
//! This module provides:
//! - The [`AudioOutput`] capability implemented by the host
//! - [`CueSink`], which plays a sequence's start cue, optional per-stage
//!   and reset cues, honoring the `muted` flag

use crate::flags::{is_muted, FlagStore};
use crate::player::{RunId, RunState};
use crate::sequence::Sequence;
use crate::sink::{StageActivation, StageSink};
use std::sync::Arc;

/// Host audio backend
pub trait AudioOutput: Send + Sync {
    /// Play a named cue
    fn play(&self, cue: &str);

    /// Stop every cue that is still playing
    fn stop_all(&self);
}

/// Sink translating playback into audio cues.
///
/// The mute flag is read on every notification, so toggling it mid-run
/// takes effect on the next stage.
pub struct CueSink {
    output: Arc<dyn AudioOutput>,
    flags: Arc<dyn FlagStore>,
    stage_cue: Option<String>,
    reset_cue: Option<String>,
}

impl CueSink {
    /// Create a cue sink playing only start cues
    pub fn new(output: Arc<dyn AudioOutput>, flags: Arc<dyn FlagStore>) -> Self {
        Self {
            output,
            flags,
            stage_cue: None,
            reset_cue: None,
        }
    }

    /// Also play `cue` whenever a stage activates
    pub fn with_stage_cue(mut self, cue: impl Into<String>) -> Self {
        self.stage_cue = Some(cue.into());
        self
    }

    /// Play `cue` when a run is reset, before stopping other audio
    pub fn with_reset_cue(mut self, cue: impl Into<String>) -> Self {
        self.reset_cue = Some(cue.into());
        self
    }

    fn play(&self, cue: &str) {
        if is_muted(self.flags.as_ref()) {
            tracing::trace!(cue, "cue skipped, audio muted");
            return;
        }
        self.output.play(cue);
    }
}

impl StageSink for CueSink {
    fn run_started(&self, _run: RunId, sequence: &Sequence) {
        if let Some(cue) = &sequence.cue {
            self.play(cue);
        }
    }

    fn stage_activated(&self, _activation: &StageActivation) {
        if let Some(cue) = &self.stage_cue {
            self.play(cue);
        }
    }

    fn run_finished(&self, _run: RunId, outcome: RunState) {
        if outcome == RunState::Cancelled {
            if let Some(cue) = &self.reset_cue {
                self.play(cue);
            }
            self.output.stop_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{set_muted, MemoryFlagStore};
    use crate::stage::Stage;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeOutput {
        played: Mutex<Vec<String>>,
        stops: Mutex<usize>,
    }

    impl AudioOutput for FakeOutput {
        fn play(&self, cue: &str) {
            self.played.lock().push(cue.to_string());
        }

        fn stop_all(&self) {
            *self.stops.lock() += 1;
        }
    }

    fn attack() -> Sequence {
        let stage = Stage::at_millis("stage1", "Suspicious traffic", 0);
        Sequence::from_stages("attack", [stage])
            .unwrap()
            .with_cue("alert")
    }

    fn setup() -> (Arc<FakeOutput>, Arc<MemoryFlagStore>, CueSink) {
        let output = Arc::new(FakeOutput::default());
        let flags = Arc::new(MemoryFlagStore::new());
        let sink = CueSink::new(output.clone(), flags.clone()).with_stage_cue("click");
        (output, flags, sink)
    }

    #[test]
    fn test_plays_start_and_stage_cues() {
        let (output, _flags, sink) = setup();
        let sequence = attack();
        let run = RunId::new();

        sink.run_started(run, &sequence);
        sink.stage_activated(&StageActivation::new(run, &sequence, 0, Duration::ZERO));

        assert_eq!(*output.played.lock(), ["alert", "click"]);
    }

    #[test]
    fn test_muted_plays_nothing() {
        let (output, flags, sink) = setup();
        set_muted(flags.as_ref(), true);
        let sequence = attack();
        let run = RunId::new();

        sink.run_started(run, &sequence);
        sink.stage_activated(&StageActivation::new(run, &sequence, 0, Duration::ZERO));

        assert!(output.played.lock().is_empty());
    }

    #[test]
    fn test_cancel_stops_audio() {
        let (output, _flags, sink) = setup();
        sink.run_finished(RunId::new(), RunState::Completed);
        assert_eq!(*output.stops.lock(), 0);
        sink.run_finished(RunId::new(), RunState::Cancelled);
        assert_eq!(*output.stops.lock(), 1);
        assert!(output.played.lock().is_empty());
    }

    #[test]
    fn test_reset_cue_plays_on_cancel_only() {
        let (output, flags, sink) = setup();
        let sink = sink.with_reset_cue("click");

        sink.run_finished(RunId::new(), RunState::Completed);
        assert!(output.played.lock().is_empty());

        sink.run_finished(RunId::new(), RunState::Cancelled);
        assert_eq!(*output.played.lock(), ["click"]);

        set_muted(flags.as_ref(), true);
        sink.run_finished(RunId::new(), RunState::Cancelled);
        assert_eq!(output.played.lock().len(), 1);
        assert_eq!(*output.stops.lock(), 2);
    }
}
