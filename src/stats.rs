//! Episode statistics and the sinks that receive them.
//!
//! A plot sink sees one `EpisodeSummary` per finished episode and never feeds
//! anything back into training.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What one finished episode looked like
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// 1-based episode number
    pub episode: u64,
    /// Points the agent scored before conceding
    pub score: u32,
    /// Best score over all episodes so far
    pub record: u32,
    /// Mean score over all episodes so far
    pub mean_score: f64,
    pub ticks: u64,
    /// Ended by the tick limit rather than by conceding
    pub truncated: bool,
    /// Loss of the end-of-episode replay update
    pub loss: f32,
}

/// Running record and mean of episode scores
#[derive(Debug, Clone, Default)]
pub struct ScoreTracker {
    episodes: u64,
    total_score: u64,
    record: u32,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an episode's score; returns true when it beats the record
    pub fn record_episode(&mut self, score: u32) -> bool {
        self.episodes += 1;
        self.total_score += u64::from(score);
        if score > self.record {
            self.record = score;
            return true;
        }
        false
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn record(&self) -> u32 {
        self.record
    }

    pub fn mean_score(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.total_score as f64 / self.episodes as f64
    }
}

/// Receiver for per-episode score data
pub trait PlotSink {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()>;
}

/// Logs each episode through `tracing`
#[derive(Debug, Default)]
pub struct TracingPlot;

impl PlotSink for TracingPlot {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        tracing::info!(
            episode = summary.episode,
            score = summary.score,
            record = summary.record,
            mean = format_args!("{:.2}", summary.mean_score),
            ticks = summary.ticks,
            "episode finished"
        );
        if summary.truncated {
            tracing::debug!(episode = summary.episode, "episode hit the tick limit");
        }
        tracing::debug!(episode = summary.episode, loss = summary.loss, "replay update");
        Ok(())
    }
}

/// Appends one JSON object per episode to a file, for external plotting
pub struct JsonlScoreLog {
    writer: BufWriter<File>,
}

impl JsonlScoreLog {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl PlotSink for JsonlScoreLog {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, summary)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every summary in memory
impl PlotSink for Vec<EpisodeSummary> {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.push(summary.clone());
        Ok(())
    }
}

/// Fans one summary out to several sinks
impl PlotSink for Vec<Box<dyn PlotSink>> {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        for sink in self.iter_mut() {
            sink.record(summary)?;
        }
        Ok(())
    }
}
