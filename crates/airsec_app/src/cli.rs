// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Headless player for AirSec security demos
#[derive(Parser, Debug)]
#[command(name = "airsec", author, version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ./airsec.ron if present)
    #[arg(short = 's', long = "settings", value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Shell commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List available demos
    List,

    /// Play a demo; Ctrl-C resets it
    Play {
        /// Demo name (see `list`)
        demo: String,

        /// Reset the demo after this many milliseconds
        #[arg(long = "cancel-after", value_name = "MS")]
        cancel_after: Option<u64>,
    },

    /// Write default settings to the settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show or change the theme
    Theme {
        /// New theme, or `toggle`
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },

    /// Show or change the mute flag
    Mute {
        /// `on`, `off` or `toggle`
        #[arg(value_enum)]
        action: Option<MuteAction>,
    },
}

/// Theme changes
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    /// Dark theme
    Dark,
    /// Light theme
    Light,
    /// Flip the current theme
    Toggle,
}

/// Mute changes
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteAction {
    /// Mute audio
    On,
    /// Unmute audio
    Off,
    /// Flip the mute flag
    Toggle,
}
