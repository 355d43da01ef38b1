//! qpong: a two-paddle Pong match with a Q-learning agent on the left paddle.
//!
//! The simulation (`game`), the learner (`agent`) and the loop that couples
//! them (`training`) are plain synchronous code; rendering, input and score
//! plotting plug in through small traits.

pub mod agent;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod modes;
pub mod opponent;
pub mod stats;
pub mod training;
pub mod ui;

pub use error::{Error, Result};
