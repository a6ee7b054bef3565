//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Connection and protocol buffer settings.
    pub network: NetworkConfig,
    /// Chunk cache settings.
    pub world: WorldConfig,
    /// Mesh build settings.
    pub mesh: MeshConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Network and protocol decoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Server address to connect to.
    pub server_address: String,
    /// Server port.
    pub server_port: u16,
    /// Capacity of the inbound ring buffer in bytes.
    pub read_buffer_size: usize,
    /// Capacity of the scratch buffer compressed frames inflate into.
    pub inflate_buffer_size: usize,
    /// Longest string (in bytes) a packet may carry.
    pub max_string_len: usize,
    /// Bytes handed to the decoder per read when replaying or receiving.
    pub recv_chunk_size: usize,
}

/// World chunk cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the toroidal column cache, in columns.
    pub cache_size: usize,
    /// Block-state ids that are never meshed (barrier markers and the like).
    /// They still hide neighbor faces unless also listed as transparent.
    pub hidden_block_ids: Vec<u32>,
    /// Block-state ids that do not hide the faces of their neighbors.
    pub transparent_block_ids: Vec<u32>,
}

/// Mesh build configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshConfig {
    /// Columns meshed per scheduling pass (0 = unlimited).
    pub max_builds_per_pass: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 25565,
            read_buffer_size: 4 * 1024 * 1024,
            inflate_buffer_size: 65536 * 32,
            max_string_len: 32767,
            recv_chunk_size: 64 * 1024,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cache_size: 24,
            hidden_block_ids: vec![7540],
            transparent_block_ids: Vec::new(),
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            max_builds_per_pass: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Platform config directory for the client (`<config dir>/tessera`).
///
/// Falls back to the working directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("tessera"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Reads, parses and validates a config file.
fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
    let config: Config = ron::from_str(&text).map_err(ConfigError::ParseError)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Loads `config.ron` from `config_dir`, writing the defaults there first
    /// when the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_path(config_dir);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let config = read_config(&path)?;
        log::info!("Using config {}", path.display());
        Ok(config)
    }

    /// Writes this config to `config_dir/config.ron`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;
        std::fs::write(config_path(config_dir), text).map_err(ConfigError::WriteError)
    }

    /// Re-reads the file. Returns the new config only if it differs from
    /// `self`, so callers can react to edits made while running.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = read_config(&config_path(config_dir))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Config file changed on disk");
        Ok(Some(fresh))
    }

    /// Rejects values the pipeline cannot run with.
    ///
    /// The cache must be at least 3 columns wide so that a column and its
    /// horizontal neighbors never share a slot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.cache_size < 3 {
            return Err(ConfigError::InvalidValue {
                field: "world.cache_size",
                reason: format!("must be at least 3, got {}", self.world.cache_size),
            });
        }
        if self.network.read_buffer_size < 2 {
            return Err(ConfigError::InvalidValue {
                field: "network.read_buffer_size",
                reason: format!("must be at least 2, got {}", self.network.read_buffer_size),
            });
        }
        if self.network.inflate_buffer_size < 2 {
            return Err(ConfigError::InvalidValue {
                field: "network.inflate_buffer_size",
                reason: format!(
                    "must be at least 2, got {}",
                    self.network.inflate_buffer_size
                ),
            });
        }
        if self.network.recv_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.recv_chunk_size",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_client() {
        let config = Config::default();
        assert_eq!(config.network.server_port, 25565);
        assert_eq!(config.network.inflate_buffer_size, 2 * 1024 * 1024);
        assert_eq!(config.network.max_string_len, 32767);
        assert_eq!(config.world.cache_size, 24);
        assert_eq!(config.mesh.max_builds_per_pass, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ron_text_round_trips() {
        let mut config = Config::default();
        config.world.transparent_block_ids = vec![230, 231];
        config.debug.log_dir = Some(PathBuf::from("/tmp/tessera-logs"));

        let text = ron::to_string(&config).unwrap();
        let parsed: Config = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(network: (), world: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.mesh, MeshConfig::default());
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn test_barrier_hidden_by_default() {
        assert_eq!(WorldConfig::default().hidden_block_ids, vec![7540]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.cache_size = 32;
        config.network.server_address = "10.0.0.1".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.mesh.max_builds_per_pass = 8;
        modified.save(dir.path()).unwrap();

        let changed = config.reload(dir.path()).unwrap();
        assert_eq!(changed.map(|c| c.mesh.max_builds_per_pass), Some(8));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert_eq!(config.reload(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_reload_rejects_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(path, "(network: (server_port: \"x\"))").unwrap();

        assert!(matches!(
            config.reload(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_tiny_cache_rejected() {
        let mut config = Config::default();
        config.world.cache_size = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "world.cache_size",
                ..
            })
        ));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "(world: (cache_size: 1))").unwrap();
        assert!(Config::load_or_create(dir.path()).is_err());
    }
}
