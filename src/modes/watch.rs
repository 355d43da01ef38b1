//! Training in the terminal: the match is drawn every tick and the keyboard
//! can quit or, with a human opponent, drive the right paddle.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::config::{Config, OpponentKind};
use crate::error::Result;
use crate::game::{KeyboardInput, MatchState};
use crate::training::{Progress, RenderSink, RunSummary, Trainer};
use crate::ui::{self, RenderStyle};

use super::common::{frame_duration, limit_frame_rate, plot_sinks};

/// Render sink that draws each tick to a terminal and paces the frames
pub struct TerminalSink<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    style: RenderStyle,
    frame_duration: Option<Duration>,
    frame_start: Instant,
}

impl<'a, B: Backend> TerminalSink<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, style: RenderStyle, target_fps: u64) -> Self {
        Self {
            terminal,
            style,
            frame_duration: frame_duration(target_fps),
            frame_start: Instant::now(),
        }
    }
}

impl<B: Backend> RenderSink for TerminalSink<'_, B> {
    fn render(&mut self, state: &MatchState, progress: &Progress) -> Result<()> {
        let style = &self.style;
        self.terminal
            .draw(|frame| ui::render(frame, state, progress, style))?;

        if let Some(budget) = self.frame_duration {
            limit_frame_rate(self.frame_start, budget);
        }
        self.frame_start = Instant::now();
        Ok(())
    }
}

/// Train while drawing the match in the terminal until the episode cap or `q`
pub fn run_watch(config: &Config) -> anyhow::Result<RunSummary> {
    let mut trainer = Trainer::from_config(config).context("failed to set up training")?;
    let mut plot = plot_sinks(config.training.score_log.as_deref())?;
    let human = config.training.opponent == OpponentKind::Human;

    tracing::info!(
        opponent = config.training.opponent.display_name(),
        seed = config.training.seed,
        "starting terminal session"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = {
        let style = RenderStyle::from_display(&config.display, human);
        let mut sink = TerminalSink::new(&mut terminal, style, config.display.target_fps);
        trainer.run(
            config.training.episodes,
            &mut KeyboardInput,
            &mut sink,
            &mut plot,
        )
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let summary = result.context("terminal session failed")?;
    tracing::info!(
        episodes = summary.episodes,
        record = summary.record,
        quit = summary.quit,
        "terminal session ended"
    );
    Ok(summary)
}
