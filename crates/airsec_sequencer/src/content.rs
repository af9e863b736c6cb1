// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serialized sequence content.
//!
//! Content files list sequences with either explicit per-stage offsets
//! (`at_ms`) or a fixed `interval_ms` between consecutive stages:
//!
//! ```ron
//! [
//!     (
//!         name: "mfa",
//!         title: Some("MFA Demo"),
//!         interval_ms: Some(700),
//!         stages: [
//!             (id: "badge", label: "Badge tapped: ID=EMP-4379"),
//!             (id: "face", label: "Face sensor: match confidence 98%"),
//!         ],
//!     ),
//! ]
//! ```

use crate::effect::EffectKey;
use crate::sequence::{Sequence, SequenceError};
use crate::stage::{Stage, StageId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Content loading errors
#[derive(Debug, Error)]
pub enum ContentError {
    /// RON parse or validation failure
    #[error("RON content error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// JSON parse or validation failure
    #[error("JSON content error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two sequences share a name
    #[error("duplicate sequence name `{0}`")]
    DuplicateSequence(String),
}

/// Serialized form of a [`Stage`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDef {
    /// Stage ID
    pub id: StageId,
    /// Display label
    pub label: String,
    /// Offset from run start in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_ms: Option<u64>,
    /// Effect key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectKey>,
}

/// Serialized form of a [`Sequence`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDef {
    /// Lookup name
    pub name: String,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Start cue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
    /// Fixed delay between stages without an explicit offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    /// Stages in activation order
    pub stages: Vec<StageDef>,
}

impl TryFrom<SequenceDef> for Sequence {
    type Error = SequenceError;

    fn try_from(def: SequenceDef) -> Result<Self, Self::Error> {
        let mut stages = Vec::with_capacity(def.stages.len());
        for (index, stage) in (0u64..).zip(def.stages) {
            let at_ms = match (stage.at_ms, def.interval_ms) {
                (Some(at_ms), _) => at_ms,
                (None, Some(interval)) => interval.saturating_mul(index),
                (None, None) => return Err(SequenceError::MissingOffset(stage.id)),
            };
            stages.push(Stage {
                id: stage.id,
                label: stage.label,
                offset: Duration::from_millis(at_ms),
                effect: stage.effect,
            });
        }
        Sequence::from_parts(def.name, def.title, def.cue, stages)
    }
}

impl From<Sequence> for SequenceDef {
    fn from(sequence: Sequence) -> Self {
        let stages = sequence
            .stages()
            .iter()
            .map(|stage| StageDef {
                id: stage.id.clone(),
                label: stage.label.clone(),
                at_ms: Some(stage.offset_millis()),
                effect: stage.effect.clone(),
            })
            .collect();
        Self {
            name: sequence.name,
            title: sequence.title,
            cue: sequence.cue,
            interval_ms: None,
            stages,
        }
    }
}

/// Named sequences available to a presentation, in declaration order
#[derive(Debug, Clone, Default)]
pub struct SequenceLibrary {
    sequences: IndexMap<String, Sequence>,
}

impl SequenceLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a RON list of sequences
    pub fn from_ron(source: &str) -> Result<Self, ContentError> {
        let sequences: Vec<Sequence> = ron::from_str(source)?;
        Self::from_sequences(sequences)
    }

    /// Parse a JSON list of sequences
    pub fn from_json(source: &str) -> Result<Self, ContentError> {
        let sequences: Vec<Sequence> = serde_json::from_str(source)?;
        Self::from_sequences(sequences)
    }

    /// Build a library, rejecting duplicate names
    pub fn from_sequences(
        sequences: impl IntoIterator<Item = Sequence>,
    ) -> Result<Self, ContentError> {
        let mut library = Self::new();
        for sequence in sequences {
            library.insert(sequence)?;
        }
        Ok(library)
    }

    /// Add a sequence
    pub fn insert(&mut self, sequence: Sequence) -> Result<(), ContentError> {
        if self.sequences.contains_key(&sequence.name) {
            return Err(ContentError::DuplicateSequence(sequence.name));
        }
        self.sequences.insert(sequence.name.clone(), sequence);
        Ok(())
    }

    /// Get a sequence by name
    pub fn get(&self, name: &str) -> Option<&Sequence> {
        self.sequences.get(name)
    }

    /// Iterate sequences in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.values()
    }

    /// Sequence names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    /// Number of sequences
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Serialize every sequence back to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        let sequences: Vec<&Sequence> = self.sequences.values().collect();
        ron::ser::to_string_pretty(&sequences, ron::ser::PrettyConfig::default())
    }
}
