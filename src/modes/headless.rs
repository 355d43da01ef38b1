//! Headless training: no terminal, one log line per episode

use anyhow::Context;

use crate::config::{Config, OpponentKind};
use crate::training::{NoInput, RunSummary, Trainer};

use super::common::plot_sinks;

/// Train until `config.training.episodes` episodes finish (forever when unset)
pub fn run_training(config: &Config) -> anyhow::Result<RunSummary> {
    if config.training.opponent == OpponentKind::Human {
        tracing::warn!("a human opponent needs the terminal; the right paddle will not move");
    }
    let mut trainer = Trainer::from_config(config).context("failed to set up training")?;
    let mut plot = plot_sinks(config.training.score_log.as_deref())?;

    tracing::info!(
        opponent = config.training.opponent.display_name(),
        seed = config.training.seed,
        episodes = ?config.training.episodes,
        "starting headless training"
    );

    let summary = trainer
        .run(config.training.episodes, &mut NoInput, &mut (), &mut plot)
        .context("training run failed")?;

    tracing::info!(
        episodes = summary.episodes,
        record = summary.record,
        mean = format_args!("{:.2}", summary.mean_score),
        "training finished"
    );
    if let Some(path) = trainer.checkpoint_path() {
        tracing::info!(path = %path.display(), "best network is saved here");
    }
    Ok(summary)
}
