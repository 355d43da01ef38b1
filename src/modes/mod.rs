// Ways to run the trainer: headless, in the terminal, or as a greedy evaluation

pub mod common;
mod evaluate;
mod headless;
mod watch;

pub use evaluate::{run_evaluation, DEFAULT_EVAL_EPISODES};
pub use headless::run_training;
pub use watch::{run_watch, TerminalSink};
