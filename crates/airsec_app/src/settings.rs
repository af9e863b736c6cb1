// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shell settings.
//!
//! Settings live in a RON file (`airsec.ron` by default) and cover:
//! - Playback speed
//! - Where presentation flags are persisted
//! - An optional external demo content file
//! - Optional cues played on every stage and when a demo is reset
//! - Terminal bell and color output

use crate::error::{AppError, Result};
use airsec_sequencer::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file looked up in the working directory
pub const SETTINGS_FILE_NAME: &str = "airsec.ron";

/// Default flag file name
pub const FLAGS_FILE_NAME: &str = "airsec_flags.ron";

/// Shell settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Format version
    pub version: u32,
    /// Playback settings
    pub player: PlayerConfig,
    /// File holding theme/mute flags
    pub flags_file: PathBuf,
    /// Demo content replacing the bundled demos (`.ron` or `.json`)
    pub content_file: Option<PathBuf>,
    /// Cue played on every stage
    pub stage_cue: Option<String>,
    /// Cue played when a demo is reset
    pub reset_cue: Option<String>,
    /// Ring the terminal bell for cues
    pub bell: bool,
    /// Color console output according to the theme
    pub color: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            player: PlayerConfig::default(),
            flags_file: PathBuf::from(FLAGS_FILE_NAME),
            content_file: None,
            stage_cue: None,
            reset_cue: Some("click".to_string()),
            bell: true,
            color: true,
        }
    }
}

impl AppSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let settings: AppSettings = ron::from_str(&content).map_err(|source| AppError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(AppError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        settings.player.validate()?;

        Ok(settings)
    }

    /// Load an explicit settings file, or `airsec.ron` if present, or defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = Path::new(SETTINGS_FILE_NAME);
        if path.exists() {
            tracing::debug!("Loading settings from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default settings to `path`, refusing to overwrite unless `force`
    pub fn init(path: &Path, force: bool) -> Result<Self> {
        if path.exists() && !force {
            return Err(AppError::SettingsExist(path.to_path_buf()));
        }
        let settings = Self::default();
        settings.save(path)?;
        tracing::info!("Wrote settings to {}", path.display());
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content).map_err(|e| AppError::io(path, e))
    }
}
