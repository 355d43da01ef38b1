//! Greedy evaluation of a saved network: no exploration, no learning, no saves

use anyhow::Context;

use crate::config::Config;
use crate::training::{NoInput, RunSummary, Trainer};

use super::common::plot_sinks;

/// Episodes played when none are requested
pub const DEFAULT_EVAL_EPISODES: u64 = 10;

pub fn run_evaluation(config: &Config) -> anyhow::Result<RunSummary> {
    let checkpoint = config.training.checkpoint_path();
    if !checkpoint.exists() {
        tracing::warn!(
            path = %checkpoint.display(),
            "no checkpoint found, evaluating an untrained network"
        );
    }

    let mut trainer = Trainer::from_config(config).context("failed to set up evaluation")?;
    trainer.set_learning(false);
    let mut plot = plot_sinks(config.training.score_log.as_deref())?;

    let episodes = config.training.episodes.unwrap_or(DEFAULT_EVAL_EPISODES);
    let summary = trainer
        .run(Some(episodes), &mut NoInput, &mut (), &mut plot)
        .context("evaluation run failed")?;

    tracing::info!(
        episodes = summary.episodes,
        best = summary.record,
        mean = format_args!("{:.2}", summary.mean_score),
        "evaluation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_never_writes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = dir.path().join("model.bin");
        let mut config = Config::default();
        config.agent.hidden_size = 16;
        config.training.episodes = Some(2);
        config.training.max_episode_ticks = Some(2_000);
        config.training.checkpoint_path = Some(checkpoint.clone());

        let summary = run_evaluation(&config).unwrap();

        assert_eq!(summary.episodes, 2);
        assert!(!checkpoint.exists());
    }
}
