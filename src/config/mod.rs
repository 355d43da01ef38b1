// Configuration module for QPong
// Handles loading and managing simulation, learner and display settings from TOML

pub mod loader;
pub mod types;

pub use loader::{create_default_config, get_config_path, load_config, load_config_from};
pub use types::{
    AgentConfig, Config, DisplayConfig, OpponentKind, OptimizerKind, PhysicsConfig,
    TrainingConfig,
};
