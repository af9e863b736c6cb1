// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered, validated collections of stages.

use crate::content::SequenceDef;
use crate::stage::{Stage, StageId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A stage is scheduled before the stage declared ahead of it
    #[error("stage `{stage}` at {offset:?} is scheduled before the previous stage at {previous:?}")]
    DecreasingOffset {
        /// Offending stage
        stage: StageId,
        /// Its offset
        offset: Duration,
        /// Offset of the stage declared before it
        previous: Duration,
    },

    /// Two stages share an ID
    #[error("duplicate stage id `{0}`")]
    DuplicateStage(StageId),

    /// A stage has no offset and the sequence has no fixed interval
    #[error("stage `{0}` has no offset and the sequence declares no interval")]
    MissingOffset(StageId),
}

/// An ordered list of stages forming one scripted demo.
///
/// Stage offsets are non-decreasing and stage IDs are unique; every
/// constructor enforces both, so a `Sequence` value is always playable
/// unless it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SequenceDef", into = "SequenceDef")]
pub struct Sequence {
    /// Lookup name (e.g. `attack`)
    pub name: String,
    /// Human readable title
    pub title: Option<String>,
    /// Audio cue played when a run starts
    pub cue: Option<String>,
    stages: Vec<Stage>,
}

impl Sequence {
    /// Create an empty sequence
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            cue: None,
            stages: Vec::new(),
        }
    }

    /// Build a sequence from stages in declaration order
    pub fn from_stages(
        name: impl Into<String>,
        stages: impl IntoIterator<Item = Stage>,
    ) -> Result<Self, SequenceError> {
        let mut sequence = Self::new(name);
        for stage in stages {
            sequence.push_stage(stage)?;
        }
        Ok(sequence)
    }

    /// Build a sequence whose stages are `interval` apart, the first firing at zero
    pub fn with_interval<I, S>(
        name: impl Into<String>,
        interval: Duration,
        stages: impl IntoIterator<Item = (I, S)>,
    ) -> Result<Self, SequenceError>
    where
        I: Into<StageId>,
        S: Into<String>,
    {
        let stages = stages.into_iter().zip(0u32..).map(|((id, label), index)| {
            Stage::new(id, label, interval.saturating_mul(index))
        });
        Self::from_stages(name, stages)
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the start cue
    pub fn with_cue(mut self, cue: impl Into<String>) -> Self {
        self.cue = Some(cue.into());
        self
    }

    /// Append a stage, rejecting it if it breaks ordering or ID uniqueness
    pub fn push_stage(&mut self, stage: Stage) -> Result<(), SequenceError> {
        if self.stages.iter().any(|s| s.id == stage.id) {
            return Err(SequenceError::DuplicateStage(stage.id));
        }
        if let Some(last) = self.stages.last() {
            if stage.offset < last.offset {
                return Err(SequenceError::DecreasingOffset {
                    stage: stage.id,
                    offset: stage.offset,
                    previous: last.offset,
                });
            }
        }
        self.stages.push(stage);
        Ok(())
    }

    /// Stages in activation order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Get a stage by ID
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id.as_str() == id)
    }

    /// Get stage count
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the sequence has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Time from run start until the last stage fires
    pub fn total_duration(&self) -> Duration {
        self.stages.last().map(|s| s.offset).unwrap_or_default()
    }

    /// Title, falling back to the name
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Check ordering and uniqueness of an arbitrary stage list
    pub(crate) fn validate(stages: &[Stage]) -> Result<(), SequenceError> {
        let mut seen = HashSet::with_capacity(stages.len());
        for pair in stages.windows(2) {
            if pair[1].offset < pair[0].offset {
                return Err(SequenceError::DecreasingOffset {
                    stage: pair[1].id.clone(),
                    offset: pair[1].offset,
                    previous: pair[0].offset,
                });
            }
        }
        for stage in stages {
            if !seen.insert(&stage.id) {
                return Err(SequenceError::DuplicateStage(stage.id.clone()));
            }
        }
        Ok(())
    }

    pub(crate) fn from_parts(
        name: String,
        title: Option<String>,
        cue: Option<String>,
        stages: Vec<Stage>,
    ) -> Result<Self, SequenceError> {
        Self::validate(&stages)?;
        Ok(Self {
            name,
            title,
            cue,
            stages,
        })
    }
}
