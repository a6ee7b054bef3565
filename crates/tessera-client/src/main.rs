//! `tessera`: streams a play-state session into the chunk cache and mesher.
//!
//! Either replays a captured clientbound byte stream (`--replay <file>`) or
//! connects to `--server`/`--port` and answers keep-alives and teleports.
//!
//! Run with: `cargo run -p tessera-client -- --replay capture.bin`

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use clap::Parser;
use tessera_client::{
    ConfigReloader, DriveSummary, DriverError, HeadlessMeshStore, RELOAD_PERIOD, Session,
};
use tessera_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config from {}: {err}", config_dir.display());
            Config::default()
        }
    };
    let mut reloader = ConfigReloader::new(config_dir, config.clone(), RELOAD_PERIOD);
    config.apply_cli_overrides(&args);

    tessera_log::init_logging(
        config.debug.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );

    if let Err(err) = config.validate() {
        error!("Invalid configuration: {err}");
        return ExitCode::FAILURE;
    }

    let (reply_tx, reply_rx) = crossbeam_channel::unbounded();
    let mut session = Session::new(&config, HeadlessMeshStore::new(), reply_tx);

    let result = match &args.replay {
        Some(path) => {
            info!("Replaying {}", path.display());
            File::open(path)
                .map_err(DriverError::from)
                .and_then(|file| {
                    tessera_client::replay(
                        BufReader::new(file),
                        config.network.recv_chunk_size,
                        &mut session,
                        &reply_rx,
                    )
                })
        }
        None => run_live(&config, &mut session, &reply_rx, &mut reloader),
    };

    let stats = session.stats();
    let store = session.consumer();
    let camera = session.camera();
    info!(
        "Packets: {} | columns loaded: {} | edits: {} | keep-alives: {}",
        stats.packets, stats.chunks_loaded, stats.block_edits, stats.keep_alives
    );
    info!(
        "Meshes: {} live, {} vertices, {} KiB",
        store.live_count(),
        store.vertices_in_use(),
        store.bytes_in_use() / 1024
    );
    info!("Camera at {} looking along {}", camera.eye(), camera.forward());
    session.shutdown();

    match result {
        Ok(summary) => {
            report(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Session ended: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_live(
    config: &Config,
    session: &mut Session<HeadlessMeshStore>,
    replies: &crossbeam_channel::Receiver<Vec<u8>>,
    reloader: &mut ConfigReloader,
) -> Result<DriveSummary, DriverError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    info!(
        "Connecting to {}:{}",
        config.network.server_address, config.network.server_port
    );
    runtime.block_on(tessera_client::run_connected(
        &config.network.server_address,
        config.network.server_port,
        config.network.recv_chunk_size,
        session,
        replies,
        Some(reloader),
    ))
}

fn report(summary: &DriveSummary) {
    info!(
        "Done: {} bytes, {} frames, {} columns built, {} replies",
        summary.bytes, summary.frames, summary.columns_built, summary.replies
    );
}
