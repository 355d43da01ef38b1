// Bot trait for the scripted right paddle

use crate::game::{MatchState, PaddleCommand};

/// Controller for the non-learning paddle
///
/// Called once per tick before the match steps. Bots may keep internal state
/// between ticks; `reset` is called whenever a new episode starts.
pub trait Bot {
    /// Decide the opponent paddle's velocity for this tick
    ///
    /// # Returns
    /// * `Some(PaddleCommand)` - New velocity command
    /// * `None` - Keep the current velocity
    fn get_action(&mut self, state: &MatchState) -> Option<PaddleCommand>;

    /// Reset bot internal state (called when a new episode starts)
    fn reset(&mut self);

    /// Bot name for logs
    fn name(&self) -> &str;
}

/// Bot that never moves: an empty seat at the keyboard
#[derive(Debug, Default)]
pub struct IdleBot;

impl Bot for IdleBot {
    fn get_action(&mut self, _state: &MatchState) -> Option<PaddleCommand> {
        None
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "Idle"
    }
}
