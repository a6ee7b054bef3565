//! Command-line argument parsing for the Tessera client.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Tessera client command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Block-game protocol client and chunk mesher")]
pub struct CliArgs {
    /// Server address.
    #[arg(long)]
    pub server: Option<String>,

    /// Server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Column cache side length.
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replay a captured clientbound byte stream instead of connecting.
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

impl Config {
    /// Overwrites loaded values with any flags given on the command line.
    ///
    /// `--config` and `--replay` select inputs rather than settings, so they
    /// are read by the binary directly.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(server) = &args.server {
            self.network.server_address.clone_from(server);
        }
        if let Some(port) = args.port {
            self.network.server_port = port;
        }
        if let Some(cache_size) = args.cache_size {
            self.world.cache_size = cache_size;
        }
        if let Some(level) = &args.log_level {
            self.debug.log_level.clone_from(level);
        }
    }
}
