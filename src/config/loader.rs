// Configuration file loading and creation

use super::types::Config;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the path to the configuration file
pub fn get_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("qpong");
    path.push("config.toml");
    path
}

/// Load configuration from the default location, or create it if it doesn't exist
pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    "failed to parse config file, using defaults: {}",
                    e
                );
                Ok(Config::default())
            }
        }
    } else {
        create_default_config(&config_path)?;
        Ok(Config::default())
    }
}

/// Load configuration from an explicit path. Unlike `load_config`, a broken
/// file is an error rather than a silent fallback.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Create a default configuration file with helpful comments
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    let toml_string = toml::to_string_pretty(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let commented_toml = format!(
        "# QPong Configuration File\n\
         # Physics units are per tick; the agent drives the left paddle.\n\
         #\n\
         # optimizer: \"adam\" or \"sgd\"\n\
         # opponent:  \"idle\", \"tracker\" or \"human\" (human needs `qpong watch`)\n\n\
         {}",
        toml_string
    );

    fs::write(path, commented_toml)?;
    tracing::info!(path = %path.display(), "created default config file");
    Ok(())
}
