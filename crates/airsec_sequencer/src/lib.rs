// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted stage sequencer for AirSec presentations.
//!
//! This crate plays canned, timer-driven demos (attack simulation, MFA
//! walkthrough, install flow):
//! - Stages with labels, offsets and optional effects
//! - Validated sequences loaded from RON or JSON content
//! - A cancellable player with idempotent reset
//! - View/audio sinks and presentation flags
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - [`StageCursor`] deciding which stages are due, independent of any clock
//! - [`SequencePlayer`] driving the cursor from a tokio task
//! - [`StageSink`] receiving notifications, so playback runs headless

pub mod audio;
pub mod content;
pub mod cursor;
pub mod effect;
pub mod flags;
pub mod player;
pub mod sequence;
pub mod sink;
pub mod stage;

pub use audio::{AudioOutput, CueSink};
pub use content::{ContentError, SequenceDef, SequenceLibrary, StageDef};
pub use cursor::StageCursor;
pub use effect::{EffectFn, EffectKey, EffectRegistry};
pub use flags::{is_muted, set_muted, FlagStore, MemoryFlagStore, Theme, MUTED_KEY, THEME_KEY};
pub use player::{PlayerConfig, PlayerError, RunId, RunState, SequencePlayer};
pub use sequence::{Sequence, SequenceError};
pub use sink::{FanoutSink, NullSink, RecordingSink, StageActivation, StageSink};
pub use stage::{Stage, StageId};
