// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flag store persisted to a RON map.

use crate::error::{AppError, Result};
use airsec_sequencer::{FlagStore, MemoryFlagStore};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// [`FlagStore`] writing every change through to disk
pub struct FileFlagStore {
    path: PathBuf,
    flags: MemoryFlagStore,
    writer: Mutex<()>,
}

impl FileFlagStore {
    /// Open a flag file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let flags = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| AppError::io(&path, e))?;
            ron::from_str::<IndexMap<String, String>>(&content).map_err(|source| {
                AppError::Parse {
                    path: path.clone(),
                    source,
                }
            })?
        } else {
            IndexMap::new()
        };

        Ok(Self {
            path,
            flags: MemoryFlagStore::from_map(flags),
            writer: Mutex::new(()),
        })
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a flag, then set it. A failed write leaves the store unchanged.
    pub fn update(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.writer.lock();
        let mut snapshot = self.flags.snapshot();
        snapshot.insert(key.to_string(), value.to_string());

        let content = ron::ser::to_string_pretty(&snapshot, ron::ser::PrettyConfig::default())?;
        std::fs::write(&self.path, content).map_err(|e| AppError::io(&self.path, e))?;
        self.flags.set(key, value);
        Ok(())
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> Option<String> {
        self.flags.get(key)
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.update(key, value) {
            tracing::error!("Failed to persist flag `{key}`: {e}");
        }
    }
}
