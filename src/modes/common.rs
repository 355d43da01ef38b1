//! Helpers shared by the run modes

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::stats::{JsonlScoreLog, PlotSink, TracingPlot};

/// Frame budget for a target frame rate; `None` when pacing is off (0 fps)
pub fn frame_duration(target_fps: u64) -> Option<Duration> {
    (target_fps > 0).then(|| Duration::from_nanos(1_000_000_000 / target_fps))
}

/// Apply frame rate limiting to keep the watched match at a steady speed.
///
/// Call at the end of each rendered tick; sleeps for whatever is left of the
/// frame budget.
pub fn limit_frame_rate(frame_start: Instant, frame_duration: Duration) {
    let elapsed = frame_start.elapsed();
    if elapsed < frame_duration {
        std::thread::sleep(frame_duration - elapsed);
    }
}

/// Episode summaries go to the log, and to a JSON-lines file when one is configured
pub fn plot_sinks(score_log: Option<&Path>) -> anyhow::Result<Vec<Box<dyn PlotSink>>> {
    let mut sinks: Vec<Box<dyn PlotSink>> = vec![Box::new(TracingPlot)];
    if let Some(path) = score_log {
        let log = JsonlScoreLog::create(path)
            .with_context(|| format!("failed to open score log {}", path.display()))?;
        tracing::info!(path = %path.display(), "appending episode scores");
        sinks.push(Box::new(log));
    }
    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        assert_eq!(frame_duration(0), None);
        assert_eq!(frame_duration(50), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_limit_frame_rate_waits_out_the_frame() {
        let start = Instant::now();
        limit_frame_rate(start, Duration::from_millis(15));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_plot_sinks_adds_score_log() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(plot_sinks(None).unwrap().len(), 1);
        assert_eq!(plot_sinks(Some(&dir.path().join("s.jsonl"))).unwrap().len(), 2);
    }
}
