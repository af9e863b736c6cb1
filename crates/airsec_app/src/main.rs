// SPDX-License-Identifier: MIT OR Apache-2.0
//! `AirSec` - terminal shell for airport-security demo sequences
//!
//! Plays the scripted demos of the AirSec presentation:
//! - Attack simulation with alert cue and stage board
//! - MFA and access-control walkthroughs
//! - Install and integration flows
//! - Persistent theme and mute flags
//!
//! ## Architecture
//!
//! All timing lives in `airsec_sequencer`; this binary loads settings and
//! content, wires console and audio sinks to a `SequencePlayer`, and runs
//! it on a single-threaded tokio runtime.

mod app;
mod cli;
mod console;
mod demos;
mod error;
mod flag_file;
mod settings;

use app::App;
use clap::Parser;
use cli::{Args, Command};
use error::{AppError, Result};
use settings::{AppSettings, SETTINGS_FILE_NAME};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let args = Args::parse();
    init_logging(args.verbosity);

    tracing::debug!("Starting AirSec v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "airsec_app=info,airsec_sequencer=warn",
        1 => "airsec_app=info,airsec_sequencer=info",
        2 => "airsec_app=debug,airsec_sequencer=debug",
        _ => "airsec_app=trace,airsec_sequencer=trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(args: Args) -> Result<()> {
    if let Command::Init { force } = args.command {
        let path = args.settings.unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));
        AppSettings::init(&path, force)?;
        return Ok(());
    }

    let settings = AppSettings::resolve(args.settings.as_deref())?;
    let app = App::new(settings)?;
    let mut stdout = std::io::stdout();

    match args.command {
        Command::List => app.list(&mut stdout),
        Command::Play { demo, cancel_after } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(AppError::Runtime)?;
            runtime
                .block_on(app.play(&demo, stdout, stop_signal(cancel_after)))
                .map(|_| ())
        }
        Command::Init { .. } => Ok(()),
        Command::Theme { action } => {
            let theme = app.theme(action)?;
            println!("{} {}", theme.icon(), theme.as_str());
            Ok(())
        }
        Command::Mute { action } => {
            let muted = app.mute(action)?;
            println!("muted: {muted}");
            Ok(())
        }
    }
}

/// Resolves on Ctrl-C or after `cancel_after` milliseconds
async fn stop_signal(cancel_after: Option<u64>) {
    let timer = async {
        match cancel_after {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        () = timer => tracing::debug!("Cancel timer elapsed"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}
