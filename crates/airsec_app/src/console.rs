// SPDX-License-Identifier: MIT OR Apache-2.0
//! Terminal view and audio for demo playback.

use airsec_sequencer::{AudioOutput, RunId, RunState, Sequence, StageActivation, StageSink, Theme};
use chrono::{DateTime, TimeZone};
use parking_lot::Mutex;
use std::fmt::Display;
use std::io::Write;

/// Format a timestamp as HH:MM:SS in its own timezone
pub fn format_clock<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    time.format("%H:%M:%S").to_string()
}

/// Which stages of the current run have been revealed
#[derive(Debug, Default)]
pub struct StageBoard {
    revealed: Mutex<Vec<bool>>,
}

impl StageBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide every stage of a run with `len` stages
    pub fn reset(&self, len: usize) {
        *self.revealed.lock() = vec![false; len];
    }

    /// Mark a stage as revealed
    pub fn reveal(&self, index: usize) {
        if let Some(slot) = self.revealed.lock().get_mut(index) {
            *slot = true;
        }
    }

    /// Render as `[■■□□□]`
    pub fn render(&self) -> String {
        let cells: String = self
            .revealed
            .lock()
            .iter()
            .map(|&shown| if shown { '■' } else { '□' })
            .collect();
        format!("[{cells}]")
    }
}

/// Theme-dependent ANSI styling
fn palette(theme: Theme) -> (&'static str, &'static str) {
    match theme {
        Theme::Dark => ("\x1b[96m", "\x1b[0m"),
        Theme::Light => ("\x1b[34m", "\x1b[0m"),
    }
}

/// Sink printing stage labels to a writer
pub struct ConsoleSink<W: Write + Send> {
    out: Mutex<W>,
    theme: Theme,
    color: bool,
    board: Option<std::sync::Arc<StageBoard>>,
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Create a console sink over any writer
    pub fn new(out: W, theme: Theme, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            theme,
            color,
            board: None,
        }
    }

    /// Show `board` after every stage
    pub fn with_board(mut self, board: std::sync::Arc<StageBoard>) -> Self {
        self.board = Some(board);
        self
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn line(&self, text: &str) {
        let mut out = self.out.lock();
        let result = if self.color {
            let (on, off) = palette(self.theme);
            writeln!(out, "{on}{text}{off}")
        } else {
            writeln!(out, "{text}")
        };
        if let Err(e) = result.and_then(|()| out.flush()) {
            tracing::warn!("Console write failed: {e}");
        }
    }
}

impl<W: Write + Send> StageSink for ConsoleSink<W> {
    fn run_started(&self, _run: RunId, sequence: &Sequence) {
        if let Some(board) = &self.board {
            board.reset(sequence.len());
        }
        self.line(&format!("== {} ==", sequence.display_title()));
    }

    fn stage_activated(&self, activation: &StageActivation) {
        let clock = format_clock(&chrono::Local::now());
        let mut text = format!("[{clock}] {}", activation.label);
        if let Some(board) = &self.board {
            text.push(' ');
            text.push_str(&board.render());
        }
        self.line(&text);
    }

    fn run_finished(&self, _run: RunId, outcome: RunState) {
        match outcome {
            RunState::Completed => self.line("Simulation complete ✅"),
            RunState::Cancelled => self.line("Simulation reset by user."),
            RunState::Idle | RunState::Running => {}
        }
    }
}

/// Audio output ringing the terminal bell
pub struct TerminalAudio {
    bell: bool,
}

impl TerminalAudio {
    /// Create terminal audio; `bell` controls whether anything is emitted
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }
}

impl AudioOutput for TerminalAudio {
    fn play(&self, cue: &str) {
        tracing::debug!(cue, "Playing cue");
        if self.bell {
            let mut out = std::io::stdout();
            if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
                tracing::warn!("Bell failed: {e}");
            }
        }
    }

    fn stop_all(&self) {
        tracing::debug!("Audio stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsec_sequencer::Stage;
    use chrono::{FixedOffset, Utc};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_format_clock_uses_local_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 9, 23, 18, 35).unwrap();
        assert_eq!(format_clock(&utc), "23:18:35");

        let kolkata = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(format_clock(&utc.with_timezone(&kolkata)), "04:48:35");
    }

    #[test]
    fn test_format_clock_matches_local_time() {
        let now = chrono::Local::now();
        let expected = now.time().format("%H:%M:%S").to_string();
        assert_eq!(format_clock(&now), expected);
    }

    #[test]
    fn test_board_render() {
        let board = StageBoard::new();
        board.reset(3);
        board.reveal(1);
        board.reveal(7);
        assert_eq!(board.render(), "[□■□]");
    }

    #[test]
    fn test_console_transcript() {
        let board = Arc::new(StageBoard::new());
        let sink = ConsoleSink::new(Vec::new(), Theme::Light, false).with_board(board.clone());
        let sequence = Sequence::from_stages(
            "attack",
            [
                Stage::at_millis("stage1", "Suspicious outgoing traffic", 0),
                Stage::at_millis("stage2", "IDS signature match", 900),
            ],
        )
        .unwrap()
        .with_title("Attack Simulation");
        let run = RunId::new();

        sink.run_started(run, &sequence);
        board.reveal(0);
        sink.stage_activated(&activation(run, &sequence));
        sink.run_finished(run, RunState::Cancelled);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "== Attack Simulation ==");
        assert!(lines[1].ends_with("Suspicious outgoing traffic [■□]"));
        assert_eq!(lines[2], "Simulation reset by user.");
    }

    fn activation(run: RunId, sequence: &Sequence) -> StageActivation {
        let stage = &sequence.stages()[0];
        StageActivation {
            run,
            sequence: sequence.name.clone(),
            index: 0,
            stage: stage.id.clone(),
            label: stage.label.clone(),
            effect: None,
            offset: stage.offset,
            elapsed: Duration::ZERO,
        }
    }
}
