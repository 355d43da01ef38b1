// QPong configuration types
// Defaults describe a 1000×600 table and the DQN hyperparameters the agent was tuned with

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Reject values the simulation or the learner cannot work with
    pub fn validate(&self) -> Result<()> {
        let p = &self.physics;
        if p.field_width <= 0.0 || p.field_height <= 0.0 {
            return Err(Error::invalid("field dimensions must be positive"));
        }
        if p.ball_radius <= 0.0 || p.ball_radius * 2.0 >= p.field_height {
            return Err(Error::invalid("ball radius must fit inside the field"));
        }
        if p.paddle_height <= 0.0 || p.paddle_height > p.field_height {
            return Err(Error::invalid("paddle height must fit inside the field"));
        }
        if p.paddle_width <= 0.0 {
            return Err(Error::invalid("paddle width must be positive"));
        }

        let a = &self.agent;
        if a.hidden_size == 0 {
            return Err(Error::invalid("hidden_size must be at least 1"));
        }
        if a.memory_capacity == 0 {
            return Err(Error::invalid("memory_capacity must be at least 1"));
        }
        if a.batch_size == 0 {
            return Err(Error::invalid("batch_size must be at least 1"));
        }
        if a.exploration_range <= 0 {
            return Err(Error::invalid("exploration_range must be positive"));
        }
        if a.learning_rate.is_nan() || a.learning_rate <= 0.0 {
            return Err(Error::invalid("learning_rate must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // Table dimensions in simulation units
    pub field_width: f32,
    pub field_height: f32,

    pub ball_radius: f32,

    // Ball speed per tick on each axis
    pub ball_speed: f32,

    pub paddle_width: f32,
    pub paddle_height: f32,

    // Paddle movement per tick while a move command is held
    pub paddle_speed: f32,

    // Distance from the table edge to the paddle centre line
    pub paddle_margin: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            field_width: 1000.0,
            field_height: 600.0,
            ball_radius: 15.0,
            ball_speed: 7.0,
            paddle_width: 20.0,
            paddle_height: 120.0,
            paddle_speed: 5.0,
            paddle_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    // Discount rate
    pub gamma: f32,

    pub learning_rate: f32,

    pub hidden_size: usize,

    // Replay memory size; oldest transitions are dropped first
    pub memory_capacity: usize,

    // Transitions sampled for the end-of-episode update
    pub batch_size: usize,

    // Exploration threshold is epsilon_start - episodes, out of exploration_range
    pub epsilon_start: i64,
    pub exploration_range: i64,

    pub optimizer: OptimizerKind,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            learning_rate: 0.001,
            hidden_size: 256,
            memory_capacity: 100_000,
            batch_size: 1000,
            epsilon_start: 80,
            exploration_range: 200,
            optimizer: OptimizerKind::Adam,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    /// Paddle stays where it is
    Idle,
    /// Paddle follows the ball
    Tracker,
    /// Paddle driven from the keyboard (watch mode only)
    Human,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainingConfig {
    // Stop after this many episodes (runs until quit when absent)
    pub episodes: Option<u64>,

    // End an episode early after this many ticks without marking it terminal
    pub max_episode_ticks: Option<u64>,

    pub seed: u64,

    // Where the network is saved on a new record (data dir when absent)
    pub checkpoint_path: Option<PathBuf>,

    // JSON-lines file receiving one record per finished episode
    pub score_log: Option<PathBuf>,

    pub opponent: OpponentKind,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: None,
            max_episode_ticks: None,
            seed: 0,
            checkpoint_path: None,
            score_log: None,
            opponent: OpponentKind::Idle,
        }
    }
}

impl TrainingConfig {
    pub fn checkpoint_path(&self) -> PathBuf {
        if let Some(path) = &self.checkpoint_path {
            return path.clone();
        }
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("qpong");
        path.push("model.bin");
        path
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    // Target frames per second in watch mode (0 = as fast as possible)
    pub target_fps: u64,

    // Paddle color (RGB values 0-255)
    pub paddle_color: [u8; 3],

    pub ball_color: [u8; 3],

    // Header text color
    pub score_color: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            paddle_color: [255, 255, 255], // White
            ball_color: [0, 0, 255],       // Blue
            score_color: [255, 255, 255],
        }
    }
}
