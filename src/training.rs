//! Training loop: couples the match, the agent and the external collaborators.
//!
//! Each tick runs to completion before the next begins: human input →
//! opponent bot → encode → select → step → encode → short update → remember →
//! render. When the agent concedes (or the tick limit is hit) the match resets,
//! the agent trains on a replay batch and a summary goes to the plot sink.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agent::{encode, Agent, Transition};
use crate::config::Config;
use crate::error::Result;
use crate::game::{InputEvent, InputSource, MatchState};
use crate::opponent::{create_bot, Bot};
use crate::stats::{EpisodeSummary, PlotSink, ScoreTracker};

/// Receives the match once per tick, after the step has completed
pub trait RenderSink {
    fn render(&mut self, state: &MatchState, progress: &Progress) -> Result<()>;
}

/// Headless runs render nothing
impl RenderSink for () {
    fn render(&mut self, _state: &MatchState, _progress: &Progress) -> Result<()> {
        Ok(())
    }
}

/// Input source for runs without a human at the keyboard
#[derive(Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self) -> std::io::Result<Vec<InputEvent>> {
        Ok(Vec::new())
    }
}

/// Training progress shown alongside the match
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Progress {
    /// Episodes finished so far
    pub episodes: u64,
    pub record: u32,
    pub mean_score: f64,
    pub epsilon: i64,
    pub learning: bool,
}

/// What a single tick produced
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Continue,
    EpisodeFinished(EpisodeSummary),
    Quit,
}

/// How a call to `run` ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub episodes: u64,
    pub record: u32,
    pub mean_score: f64,
    pub quit: bool,
}

pub struct Trainer<R: Rng> {
    agent: Agent<R>,
    game: MatchState,
    bot: Option<Box<dyn Bot>>,
    scores: ScoreTracker,
    checkpoint_path: Option<PathBuf>,
    max_episode_ticks: Option<u64>,
    learning: bool,
}

impl Trainer<ChaCha8Rng> {
    /// Build the match, agent and opponent described by `config`.
    ///
    /// The match and the agent draw from separate streams of the configured
    /// seed. A checkpoint at the configured path is loaded when present.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let seed = config.training.seed;
        let mut match_rng = ChaCha8Rng::seed_from_u64(seed);
        match_rng.set_stream(1);
        let agent_rng = ChaCha8Rng::seed_from_u64(seed);

        let game = MatchState::new(&config.physics, match_rng);
        let agent = Agent::new(&config.agent, agent_rng)?;
        tracing::debug!(
            hidden = agent.network().hidden_size(),
            learning_rate = agent.network().learning_rate(),
            memory = agent.memory().capacity(),
            "agent ready"
        );
        let bot = create_bot(config.training.opponent);
        if let Some(bot) = bot.as_ref() {
            tracing::debug!(opponent = bot.name(), "scripted opponent");
        }

        let mut trainer = Trainer::new(agent, game, bot)
            .with_checkpoint(Some(config.training.checkpoint_path()))
            .with_max_episode_ticks(config.training.max_episode_ticks);
        trainer.load_checkpoint_if_present()?;
        Ok(trainer)
    }
}

impl<R: Rng> Trainer<R> {
    pub fn new(agent: Agent<R>, game: MatchState, bot: Option<Box<dyn Bot>>) -> Self {
        Self {
            agent,
            game,
            bot,
            scores: ScoreTracker::new(),
            checkpoint_path: None,
            max_episode_ticks: None,
            learning: true,
        }
    }

    /// Save the network here whenever a new record is set
    pub fn with_checkpoint(mut self, path: Option<PathBuf>) -> Self {
        self.checkpoint_path = path;
        self
    }

    /// End episodes after this many ticks even if the agent never concedes
    pub fn with_max_episode_ticks(mut self, max: Option<u64>) -> Self {
        self.max_episode_ticks = max.filter(|&m| m > 0);
        self
    }

    /// With learning off the agent always exploits and nothing is trained or saved
    pub fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
        self.agent.set_exploring(learning);
    }

    /// Restore the network from the checkpoint path, if a file is there
    pub fn load_checkpoint_if_present(&mut self) -> Result<bool> {
        let Some(path) = self.checkpoint_path.as_deref() else {
            return Ok(false);
        };
        if !path.exists() {
            tracing::info!(path = %path.display(), "no checkpoint found, starting fresh");
            return Ok(false);
        }
        self.agent.network_mut().load_checkpoint(path)?;
        tracing::info!(path = %path.display(), "loaded checkpoint");
        Ok(true)
    }

    /// Advance the match by one tick, applying `input` first.
    ///
    /// `render` sees the match after the step and before any episode reset,
    /// so the tick that ends an episode is drawn with its final score.
    pub fn tick(
        &mut self,
        input: &[InputEvent],
        render: &mut dyn RenderSink,
    ) -> Result<TickOutcome> {
        for event in input {
            match event {
                InputEvent::Quit => return Ok(TickOutcome::Quit),
                InputEvent::Opponent(command) => self.game.command_opponent(*command),
            }
        }

        if let Some(bot) = self.bot.as_mut() {
            if let Some(command) = bot.get_action(&self.game) {
                self.game.command_opponent(command);
            }
        }

        let state = encode(&self.game);
        let action = self.agent.select_action(&state);
        let outcome = self.game.step(action);
        let next_state = encode(&self.game);

        let events = self.game.last_events;
        if events.paddle_contacts.any() {
            tracing::trace!(tick = self.game.tick, "paddle hit");
        }
        if let Some(side) = events.goal {
            tracing::debug!(tick = self.game.tick, ?side, reward = outcome.reward, "point");
        }

        let transition = Transition {
            state,
            action,
            reward: outcome.reward,
            next_state,
            terminal: outcome.terminal,
        };
        if self.learning {
            self.agent.train_short(&transition);
            self.agent.observe(transition);
        }
        render.render(&self.game, &self.progress())?;

        let truncated = !outcome.terminal
            && self
                .max_episode_ticks
                .is_some_and(|max| self.game.tick >= max);

        if outcome.terminal || truncated {
            let summary = self.finish_episode(outcome.score, truncated)?;
            return Ok(TickOutcome::EpisodeFinished(summary));
        }
        Ok(TickOutcome::Continue)
    }

    /// Tick until `episodes` more episodes finish (forever when `None`) or
    /// the input source asks to quit
    pub fn run(
        &mut self,
        episodes: Option<u64>,
        input: &mut dyn InputSource,
        render: &mut dyn RenderSink,
        plot: &mut dyn PlotSink,
    ) -> Result<RunSummary> {
        let mut finished = 0;
        let mut quit = false;

        while episodes.map_or(true, |limit| finished < limit) {
            let events = input.poll()?;
            match self.tick(&events, render)? {
                TickOutcome::Continue => {}
                TickOutcome::EpisodeFinished(summary) => {
                    finished += 1;
                    plot.record(&summary)?;
                }
                TickOutcome::Quit => {
                    quit = true;
                    break;
                }
            }
        }

        Ok(RunSummary {
            episodes: finished,
            record: self.scores.record(),
            mean_score: self.scores.mean_score(),
            quit,
        })
    }

    pub fn progress(&self) -> Progress {
        Progress {
            episodes: self.scores.episodes(),
            record: self.scores.record(),
            mean_score: self.scores.mean_score(),
            epsilon: self.agent.epsilon(),
            learning: self.learning,
        }
    }

    pub fn game(&self) -> &MatchState {
        &self.game
    }

    pub fn agent(&self) -> &Agent<R> {
        &self.agent
    }

    pub fn checkpoint_path(&self) -> Option<&Path> {
        self.checkpoint_path.as_deref()
    }

    fn finish_episode(&mut self, score: u32, truncated: bool) -> Result<EpisodeSummary> {
        let ticks = self.game.tick;
        self.game.reset();
        if let Some(bot) = self.bot.as_mut() {
            bot.reset();
        }

        let mut loss = 0.0;
        if self.learning {
            self.agent.finish_episode();
            loss = self.agent.train_long()?;
        }

        let new_record = self.scores.record_episode(score);
        if new_record && self.learning {
            self.save_checkpoint();
        }

        Ok(EpisodeSummary {
            episode: self.scores.episodes(),
            score,
            record: self.scores.record(),
            mean_score: self.scores.mean_score(),
            ticks,
            truncated,
            loss,
        })
    }

    // A failed save should not cost the run; the next record tries again
    fn save_checkpoint(&self) {
        let Some(path) = self.checkpoint_path.as_deref() else {
            return;
        };
        match self.agent.network().save_checkpoint(path) {
            Ok(()) => tracing::info!(
                path = %path.display(),
                record = self.scores.record(),
                "saved checkpoint"
            ),
            Err(e) => tracing::warn!(path = %path.display(), "failed to save checkpoint: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, OpponentKind, PhysicsConfig};
    use crate::game::PaddleCommand;
    use crate::opponent::IdleBot;

    fn trainer(seed: u64) -> Trainer<ChaCha8Rng> {
        let mut match_rng = ChaCha8Rng::seed_from_u64(seed);
        match_rng.set_stream(1);
        let agent = Agent::new(
            &AgentConfig {
                hidden_size: 16,
                batch_size: 64,
                ..AgentConfig::default()
            },
            ChaCha8Rng::seed_from_u64(seed),
        )
        .unwrap();
        let game = MatchState::new(&PhysicsConfig::default(), match_rng);
        Trainer::new(agent, game, Some(Box::new(IdleBot))).with_max_episode_ticks(Some(5_000))
    }

    struct Scripted(Vec<Vec<InputEvent>>);

    impl InputSource for Scripted {
        fn poll(&mut self) -> std::io::Result<Vec<InputEvent>> {
            Ok(if self.0.is_empty() {
                Vec::new()
            } else {
                self.0.remove(0)
            })
        }
    }

    #[derive(Default)]
    struct CountingRender {
        frames: u64,
        max_tick: u64,
    }

    impl RenderSink for CountingRender {
        fn render(&mut self, state: &MatchState, _progress: &Progress) -> Result<()> {
            self.frames += 1;
            self.max_tick = self.max_tick.max(state.tick);
            Ok(())
        }
    }

    #[test]
    fn test_run_finishes_requested_episodes() {
        let mut trainer = trainer(1);
        let mut plot: Vec<EpisodeSummary> = Vec::new();
        let mut render = CountingRender::default();

        let summary = trainer
            .run(Some(3), &mut NoInput, &mut render, &mut plot)
            .unwrap();

        assert_eq!(summary.episodes, 3);
        assert!(!summary.quit);
        assert_eq!(plot.len(), 3);
        assert_eq!(
            plot.iter().map(|s| s.episode).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(render.frames, plot.iter().map(|s| s.ticks).sum::<u64>());
        assert_eq!(trainer.agent().episodes(), 3);
        assert_eq!(trainer.agent().memory().len() as u64, render.frames);
        assert_eq!(trainer.game().tick, 0);
    }

    #[derive(Default)]
    struct FinalFrames {
        terminal_frames: u64,
        opponent_points: Vec<u32>,
    }

    impl RenderSink for FinalFrames {
        fn render(&mut self, state: &MatchState, _progress: &Progress) -> Result<()> {
            if state.is_terminal() {
                self.terminal_frames += 1;
                self.opponent_points.push(state.opponent_score);
            }
            Ok(())
        }
    }

    #[test]
    fn test_render_sees_the_conceding_tick_before_reset() {
        let mut trainer = trainer(6);
        let mut render = FinalFrames::default();
        let mut plot: Vec<EpisodeSummary> = Vec::new();

        trainer
            .run(Some(3), &mut NoInput, &mut render, &mut plot)
            .unwrap();

        // Every episode that ended on a goal was drawn with the goal counted
        let conceded = plot.iter().filter(|s| !s.truncated).count() as u64;
        assert!(conceded >= 1);
        assert_eq!(render.terminal_frames, conceded);
        assert!(render.opponent_points.iter().all(|&points| points == 1));
        assert_eq!(trainer.game().opponent_score, 0);
    }

    #[test]
    fn test_quit_stops_before_stepping() {
        let mut trainer = trainer(2);
        let mut input = Scripted(vec![
            vec![InputEvent::Opponent(PaddleCommand::Up)],
            vec![InputEvent::Quit],
        ]);

        let summary = trainer
            .run(None, &mut input, &mut (), &mut Vec::<EpisodeSummary>::new())
            .unwrap();

        assert!(summary.quit);
        assert_eq!(trainer.game().tick, 1);
        assert_eq!(trainer.game().opponent_paddle.velocity, -5.0);
    }

    #[test]
    fn test_tick_limit_truncates_without_terminal_transition() {
        let mut trainer = trainer(3).with_max_episode_ticks(Some(10));
        let mut last = TickOutcome::Continue;
        for _ in 0..10 {
            last = trainer.tick(&[], &mut ()).unwrap();
        }

        match last {
            TickOutcome::EpisodeFinished(summary) => {
                assert!(summary.truncated);
                assert_eq!(summary.ticks, 10);
            }
            other => panic!("expected finished episode, got {:?}", other),
        }
        assert!(trainer.agent().memory().iter().all(|t| !t.terminal));
    }

    #[test]
    fn test_evaluation_mode_leaves_agent_untouched() {
        let mut trainer = trainer(4);
        trainer.set_learning(false);
        let sample = [0.4, 0.5, 0.1];
        let before = trainer.agent().network().predict(&sample);

        trainer
            .run(Some(2), &mut NoInput, &mut (), &mut Vec::<EpisodeSummary>::new())
            .unwrap();

        assert_eq!(trainer.agent().network().predict(&sample), before);
        assert!(trainer.agent().memory().is_empty());
        assert_eq!(trainer.agent().episodes(), 0);
        assert_eq!(trainer.progress().episodes, 2);
    }

    #[test]
    fn test_new_record_writes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let mut trainer = trainer(5).with_checkpoint(Some(path.clone()));

        // Hand the agent a point: park the ball at the opponent's edge
        trainer.game.ball.x = 980.0;
        trainer.game.ball.vx = 7.0;
        trainer.game.opponent_paddle.y = 0.0;
        let mut plot: Vec<EpisodeSummary> = Vec::new();
        trainer.run(Some(1), &mut NoInput, &mut (), &mut plot).unwrap();

        assert!(plot[0].score >= 1);
        assert_eq!(plot[0].record, plot[0].score);
        assert!(path.exists());
    }

    #[test]
    fn test_from_config_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.agent.hidden_size = 16;
        config.training.seed = 9;
        config.training.opponent = OpponentKind::Tracker;
        config.training.max_episode_ticks = Some(5_000);
        config.training.checkpoint_path = Some(dir.path().join("absent.bin"));

        let mut a = Trainer::from_config(&config).unwrap();
        let mut b = Trainer::from_config(&config).unwrap();
        let mut plot_a: Vec<EpisodeSummary> = Vec::new();
        let mut plot_b: Vec<EpisodeSummary> = Vec::new();
        a.run(Some(3), &mut NoInput, &mut (), &mut plot_a).unwrap();
        b.run(Some(3), &mut NoInput, &mut (), &mut plot_b).unwrap();

        assert_eq!(plot_a, plot_b);
        let sample = [0.3, 0.6, 0.3];
        assert_eq!(
            a.agent().network().predict(&sample),
            b.agent().network().predict(&sample)
        );
        assert_eq!(
            a.agent().greedy_action(&sample),
            b.agent().greedy_action(&sample)
        );
    }
}
