// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shell commands: listing, playback and presentation flags.

use crate::cli::{MuteAction, ThemeAction};
use crate::console::{ConsoleSink, StageBoard, TerminalAudio};
use crate::demos;
use crate::error::{AppError, Result};
use crate::flag_file::FileFlagStore;
use crate::settings::AppSettings;
use airsec_sequencer::{
    is_muted, AudioOutput, CueSink, FanoutSink, RunState, SequenceLibrary, SequencePlayer,
    Theme, MUTED_KEY, THEME_KEY,
};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;

/// The presentation shell
pub struct App {
    settings: AppSettings,
    library: SequenceLibrary,
    flags: Arc<FileFlagStore>,
    audio: Arc<dyn AudioOutput>,
}

impl App {
    /// Load content and flags described by `settings`
    pub fn new(settings: AppSettings) -> Result<Self> {
        let library = demos::load_library(settings.content_file.as_deref())?;
        let flags = Arc::new(FileFlagStore::open(&settings.flags_file)?);
        tracing::debug!("Flags stored in {}", flags.path().display());
        let audio = Arc::new(TerminalAudio::new(settings.bell));
        Ok(Self::with_parts(settings, library, flags, audio))
    }

    /// Assemble a shell from already-loaded parts
    pub fn with_parts(
        settings: AppSettings,
        library: SequenceLibrary,
        flags: Arc<FileFlagStore>,
        audio: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            settings,
            library,
            flags,
            audio,
        }
    }

    /// Write one line per demo
    pub fn list(&self, out: &mut impl Write) -> Result<()> {
        let write_err = |e| AppError::io("<stdout>", e);
        for sequence in self.library.iter() {
            writeln!(
                out,
                "{:<12} {:<26} {} stages, {:.1}s",
                sequence.name,
                sequence.display_title(),
                sequence.len(),
                sequence.total_duration().as_secs_f64(),
            )
            .map_err(write_err)?;
        }
        Ok(())
    }

    /// Play `demo`, printing to `out`, until it completes or `stop` resolves.
    ///
    /// `stop` resolving first resets the run.
    pub async fn play<W, F>(&self, demo: &str, out: W, stop: F) -> Result<RunState>
    where
        W: Write + Send + 'static,
        F: Future<Output = ()>,
    {
        let sequence = self
            .library
            .get(demo)
            .cloned()
            .ok_or_else(|| AppError::UnknownDemo(demo.to_string()))?;

        let theme = Theme::load(self.flags.as_ref());
        let board = Arc::new(StageBoard::new());
        let console = ConsoleSink::new(out, theme, self.settings.color).with_board(board.clone());
        let mut cues = CueSink::new(self.audio.clone(), self.flags.clone());
        if let Some(cue) = &self.settings.stage_cue {
            cues = cues.with_stage_cue(cue.clone());
        }
        if let Some(cue) = &self.settings.reset_cue {
            cues = cues.with_reset_cue(cue.clone());
        }
        let sink = FanoutSink::new()
            .with(Arc::new(console))
            .with(Arc::new(cues));

        let player = SequencePlayer::with_options(
            Arc::new(sink),
            self.settings.player,
            demos::effects(board),
        )?;
        player.start(sequence)?;

        let outcome = tokio::select! {
            state = player.wait() => state,
            () = stop => player.reset(),
        };
        tracing::info!(demo, %outcome, fired = player.fired(), "Demo finished");
        Ok(outcome)
    }

    /// Show or change the theme, returning the resulting theme
    pub fn theme(&self, action: Option<ThemeAction>) -> Result<Theme> {
        let current = Theme::load(self.flags.as_ref());
        let theme = match action {
            None => return Ok(current),
            Some(ThemeAction::Dark) => Theme::Dark,
            Some(ThemeAction::Light) => Theme::Light,
            Some(ThemeAction::Toggle) => current.flipped(),
        };
        self.flags.update(THEME_KEY, theme.as_str())?;
        tracing::debug!("Theme set to {}", theme.as_str());
        Ok(theme)
    }

    /// Show or change the mute flag, returning whether audio is muted
    pub fn mute(&self, action: Option<MuteAction>) -> Result<bool> {
        let current = is_muted(self.flags.as_ref());
        let muted = match action {
            None => return Ok(current),
            Some(MuteAction::On) => true,
            Some(MuteAction::Off) => false,
            Some(MuteAction::Toggle) => !current,
        };
        self.flags.update(MUTED_KEY, if muted { "true" } else { "false" })?;
        if muted {
            self.audio.stop_all();
        }
        Ok(muted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    #[derive(Default)]
    struct CountingAudio {
        played: Mutex<Vec<String>>,
        stops: Mutex<usize>,
    }

    impl AudioOutput for CountingAudio {
        fn play(&self, cue: &str) {
            self.played.lock().push(cue.to_string());
        }

        fn stop_all(&self) {
            *self.stops.lock() += 1;
        }
    }

    fn test_app() -> (App, Arc<CountingAudio>, PathBuf) {
        let flags_path =
            std::env::temp_dir().join(format!("airsec-app-flags-{}.ron", uuid::Uuid::new_v4()));
        let settings = AppSettings {
            flags_file: flags_path.clone(),
            bell: false,
            color: false,
            ..AppSettings::default()
        };
        let audio = Arc::new(CountingAudio::default());
        let app = App::with_parts(
            settings,
            demos::load_library(None).unwrap(),
            Arc::new(FileFlagStore::open(&flags_path).unwrap()),
            audio.clone(),
        );
        (app, audio, flags_path)
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_access_demo() {
        let (app, audio, flags_path) = test_app();
        let out = SharedBuf::default();

        let outcome = app
            .play("access", out.clone(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(outcome, RunState::Completed);
        let text = out.text();
        assert!(text.starts_with("== Access Control Workflow =="));
        assert!(text.contains("Door Unlocked & Logged"));
        assert!(text.trim_end().ends_with("Simulation complete ✅"));
        assert_eq!(*audio.played.lock(), ["click"]);
        std::fs::remove_file(&flags_path).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_attack_cancelled() {
        let (app, audio, flags_path) = test_app();
        let out = SharedBuf::default();

        let outcome = app
            .play(
                "attack",
                out.clone(),
                tokio::time::sleep(Duration::from_millis(1000)),
            )
            .await
            .unwrap();

        assert_eq!(outcome, RunState::Cancelled);
        let text = out.text();
        assert!(text.contains("IDS signature match"));
        assert!(!text.contains("SIEM correlates"));
        assert!(text.contains("[■■□□□]"));
        assert!(text.trim_end().ends_with("Simulation reset by user."));
        assert_eq!(*audio.played.lock(), ["alert", "click"]);
        assert_eq!(*audio.stops.lock(), 1);
        std::fs::remove_file(&flags_path).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_muted_play_is_silent() {
        let (app, audio, flags_path) = test_app();
        assert!(app.mute(Some(MuteAction::On)).unwrap());

        app.play("mfa", SharedBuf::default(), std::future::pending())
            .await
            .unwrap();
        assert!(audio.played.lock().is_empty());
        std::fs::remove_file(&flags_path).ok();
    }

    #[tokio::test]
    async fn test_unknown_demo() {
        let (app, _audio, _flags_path) = test_app();
        let err = app
            .play("nope", SharedBuf::default(), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownDemo(name) if name == "nope"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_cue_is_opt_in() {
        let (mut app, audio, flags_path) = test_app();
        app.settings.stage_cue = Some("tick".to_string());

        app.play("access", SharedBuf::default(), std::future::pending())
            .await
            .unwrap();
        let played = audio.played.lock();
        assert_eq!(played.first().map(String::as_str), Some("click"));
        assert_eq!(played.iter().filter(|cue| *cue == "tick").count(), 4);
        std::fs::remove_file(&flags_path).ok();
    }

    #[test]
    fn test_theme_and_mute_commands() {
        let (app, audio, flags_path) = test_app();

        assert_eq!(app.theme(None).unwrap(), Theme::Light);
        assert_eq!(app.theme(Some(ThemeAction::Toggle)).unwrap(), Theme::Dark);
        assert_eq!(app.theme(Some(ThemeAction::Dark)).unwrap(), Theme::Dark);

        assert!(!app.mute(None).unwrap());
        assert!(app.mute(Some(MuteAction::Toggle)).unwrap());
        assert_eq!(*audio.stops.lock(), 1);
        assert!(!app.mute(Some(MuteAction::Off)).unwrap());

        let reopened = FileFlagStore::open(&flags_path).unwrap();
        assert_eq!(Theme::load(&reopened), Theme::Dark);
        assert!(!is_muted(&reopened));
        std::fs::remove_file(&flags_path).ok();
    }

    #[test]
    fn test_list() {
        let (app, _audio, _flags_path) = test_app();
        let mut out = Vec::new();
        app.list(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), app.library.len());
        assert!(text.lines().next().unwrap().starts_with("attack"));
        assert!(text.contains("4 stages, 2.1s"));
    }
}
