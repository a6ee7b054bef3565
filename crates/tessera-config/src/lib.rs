//! Configuration system for the Tessera client.
//!
//! Settings persist to disk as a RON file. CLI flags parsed with clap override
//! the loaded values, and a reload check reports edits made while running.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, MeshConfig, NetworkConfig, WorldConfig,
    default_config_dir,
};
pub use error::ConfigError;
