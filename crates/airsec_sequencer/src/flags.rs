// SPDX-License-Identifier: MIT OR Apache-2.0
//! Presentation-wide key/value flags (theme, mute).
//!
//! The store is owned by the caller and handed to whichever sinks need it.
//! Writes are last-write-wins; the player itself never touches it.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Flag holding the theme name
pub const THEME_KEY: &str = "theme";

/// Flag holding `"true"` while audio is muted
pub const MUTED_KEY: &str = "muted";

/// Key/value flag capability
pub trait FlagStore: Send + Sync {
    /// Read a flag
    fn get(&self, key: &str) -> Option<String>;

    /// Write a flag
    fn set(&self, key: &str, value: &str);
}

/// In-memory flag store
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: RwLock<IndexMap<String, String>>,
}

impl MemoryFlagStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `flags`
    pub fn from_map(flags: IndexMap<String, String>) -> Self {
        Self {
            flags: RwLock::new(flags),
        }
    }

    /// Copy of every flag in insertion order
    pub fn snapshot(&self) -> IndexMap<String, String> {
        self.flags.read().clone()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Option<String> {
        self.flags.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.flags.write().insert(key.to_string(), value.to_string());
    }
}

/// Presentation color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme (default)
    #[default]
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// Flag value for this theme
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a flag value; anything but `dark` is light
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    /// The other theme
    pub fn flipped(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Toggle-button glyph shown for this theme
    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }

    /// Read the current theme
    pub fn load(store: &dyn FlagStore) -> Self {
        Self::from_flag(store.get(THEME_KEY).as_deref())
    }

    /// Persist this theme
    pub fn save(self, store: &dyn FlagStore) {
        store.set(THEME_KEY, self.as_str());
    }

    /// Flip and persist the current theme, returning the new one
    pub fn toggle(store: &dyn FlagStore) -> Self {
        let theme = Self::load(store).flipped();
        theme.save(store);
        theme
    }
}

/// Whether audio is muted
pub fn is_muted(store: &dyn FlagStore) -> bool {
    store.get(MUTED_KEY).as_deref() == Some("true")
}

/// Set the mute flag
pub fn set_muted(store: &dyn FlagStore, muted: bool) {
    store.set(MUTED_KEY, if muted { "true" } else { "false" });
}
