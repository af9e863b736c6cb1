// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named stage effects.
//!
//! Stages refer to effects by key so sequence content can stay plain data.
//! The view layer registers the matching callbacks before playback.

use crate::player::PlayerError;
use crate::sequence::Sequence;
use crate::sink::StageActivation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Key referencing a registered effect
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectKey(pub String);

impl EffectKey {
    /// Borrow the raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EffectKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for EffectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Callback run when a stage carrying its key activates
pub type EffectFn = Arc<dyn Fn(&StageActivation) + Send + Sync>;

/// Registry of effect callbacks
#[derive(Clone, Default)]
pub struct EffectRegistry {
    effects: IndexMap<EffectKey, EffectFn>,
}

impl EffectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effect, replacing any previous one with the same key
    pub fn register<F>(&mut self, key: impl Into<EffectKey>, effect: F) -> &mut Self
    where
        F: Fn(&StageActivation) + Send + Sync + 'static,
    {
        self.effects.insert(key.into(), Arc::new(effect));
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F>(mut self, key: impl Into<EffectKey>, effect: F) -> Self
    where
        F: Fn(&StageActivation) + Send + Sync + 'static,
    {
        self.register(key, effect);
        self
    }

    /// Whether an effect is registered under `key`
    pub fn contains(&self, key: &EffectKey) -> bool {
        self.effects.contains_key(key)
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &EffectKey> {
        self.effects.keys()
    }

    /// Number of registered effects
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effects are registered
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Ensure every effect referenced by `sequence` is registered
    pub fn check(&self, sequence: &Sequence) -> Result<(), PlayerError> {
        for stage in sequence.stages() {
            if let Some(effect) = &stage.effect {
                if !self.contains(effect) {
                    return Err(PlayerError::UnknownEffect {
                        stage: stage.id.clone(),
                        effect: effect.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run the effect referenced by an activation, if any
    pub(crate) fn invoke(&self, activation: &StageActivation) {
        let Some(key) = &activation.effect else {
            return;
        };
        if let Some(effect) = self.effects.get(key) {
            effect(activation);
        }
    }
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.effects.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    #[test]
    fn test_check_reports_unknown_effect() {
        let registry = EffectRegistry::new().with("reveal", |_| {});
        let sequence = Sequence::from_stages(
            "attack",
            [
                Stage::at_millis("stage1", "Suspicious traffic", 0).with_effect("reveal"),
                Stage::at_millis("stage2", "IDS match", 900).with_effect("shake"),
            ],
        )
        .unwrap();

        let err = registry.check(&sequence).unwrap_err();
        assert!(matches!(
            err,
            PlayerError::UnknownEffect { ref stage, ref effect }
                if stage.as_str() == "stage2" && effect.as_str() == "shake"
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = EffectRegistry::new();
        registry.register("reveal", |_| {}).register("reveal", |_| {});
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&EffectKey::from("reveal")));
    }
}
