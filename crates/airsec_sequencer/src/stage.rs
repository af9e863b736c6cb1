// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage definitions for scripted sequences.

use crate::effect::EffectKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifier of a stage, unique within its sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub String);

impl StageId {
    /// Create a stage ID from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One timed step of a sequence.
///
/// `offset` is measured from the moment the run starts, not from the
/// previous stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Stage ID
    pub id: StageId,
    /// Text shown when the stage activates
    pub label: String,
    /// Activation time relative to run start
    pub offset: Duration,
    /// Effect run by the view layer on activation
    pub effect: Option<EffectKey>,
}

impl Stage {
    /// Create a new stage
    pub fn new(id: impl Into<StageId>, label: impl Into<String>, offset: Duration) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            offset,
            effect: None,
        }
    }

    /// Create a stage activating `millis` milliseconds after run start
    pub fn at_millis(id: impl Into<StageId>, label: impl Into<String>, millis: u64) -> Self {
        Self::new(id, label, Duration::from_millis(millis))
    }

    /// Attach an effect
    pub fn with_effect(mut self, effect: impl Into<EffectKey>) -> Self {
        self.effect = Some(effect.into());
        self
    }

    /// Offset in whole milliseconds
    pub fn offset_millis(&self) -> u64 {
        u64::try_from(self.offset.as_millis()).unwrap_or(u64::MAX)
    }
}
