// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application errors.

use airsec_sequencer::{ContentError, PlayerError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the shell
#[derive(Debug, Error)]
pub enum AppError {
    /// File could not be read or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// RON file could not be parsed
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ron::error::SpannedError,
    },

    /// Value could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Settings written by a newer version
    #[error("settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// Refusing to overwrite an existing settings file
    #[error("{} already exists; pass --force to overwrite", .0.display())]
    SettingsExist(PathBuf),

    /// Content file extension is not `.ron` or `.json`
    #[error("content file {} must end in .ron or .json", .0.display())]
    UnknownContentFormat(PathBuf),

    /// Content could not be loaded
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Demo name not found in the library
    #[error("unknown demo `{0}`; run `airsec list` to see available demos")]
    UnknownDemo(String),

    /// Playback could not start
    #[error(transparent)]
    Player(#[from] PlayerError),

    /// Async runtime failed to start
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl AppError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for application operations
pub type Result<T> = std::result::Result<T, AppError>;
