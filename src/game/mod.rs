pub mod action;
pub mod input;
pub mod physics;
pub mod state;

pub use action::{Action, ACTION_COUNT};
pub use input::{InputEvent, InputSource, KeyboardInput};
pub use physics::{PaddleContacts, PhysicsEvents, WallEvent};
pub use state::{
    Ball, Field, MatchState, Paddle, PaddleCommand, Side, StepOutcome, REWARD_CONCEDED,
    REWARD_SCORED,
};
