// Opponents for the right paddle

mod bot;
mod tracker_bot;

pub use bot::{Bot, IdleBot};
pub use tracker_bot::TrackerBot;

use crate::config::OpponentKind;

impl OpponentKind {
    /// Get display name for opponent kind
    pub fn display_name(&self) -> &str {
        match self {
            OpponentKind::Idle => "Idle",
            OpponentKind::Tracker => "Tracker",
            OpponentKind::Human => "Human",
        }
    }
}

/// Create the scripted controller for an opponent kind.
///
/// A human opponent has no bot; its commands come from the input source.
pub fn create_bot(kind: OpponentKind) -> Option<Box<dyn Bot>> {
    match kind {
        OpponentKind::Idle => Some(Box::new(IdleBot)),
        OpponentKind::Tracker => Some(Box::new(TrackerBot::new())),
        OpponentKind::Human => None,
    }
}
