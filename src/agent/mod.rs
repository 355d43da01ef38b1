// Reinforcement-learning agent for the left paddle

pub mod encoder;
pub mod learner;
pub mod memory;
pub mod network;

pub use encoder::{encode, StateVector, STATE_SIZE};
pub use learner::Agent;
pub use memory::{ReplayMemory, Transition};
pub use network::{ActionValues, QNetwork};
