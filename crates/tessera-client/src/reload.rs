//! Periodic re-read of `config.ron` while a live session runs.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tessera_config::Config;

/// How often a live session looks at the config file.
pub const RELOAD_PERIOD: Duration = Duration::from_secs(2);

/// Tracks the on-disk config and reports edits.
///
/// Compares against the file contents, not the running config, so CLI
/// overrides never count as an edit.
pub struct ConfigReloader {
    dir: PathBuf,
    on_disk: Config,
    period: Duration,
    last_check: Instant,
}

impl ConfigReloader {
    /// `on_disk` is the config as loaded from `dir`, before CLI overrides.
    pub fn new(dir: PathBuf, on_disk: Config, period: Duration) -> Self {
        Self {
            dir,
            on_disk,
            period,
            last_check: Instant::now(),
        }
    }

    /// Re-reads the file if `period` has passed since the last check.
    ///
    /// Returns the new config when the file changed. A file that fails to
    /// parse or validate is logged and skipped.
    pub fn poll(&mut self, now: Instant) -> Option<&Config> {
        if now.saturating_duration_since(self.last_check) < self.period {
            return None;
        }
        self.last_check = now;

        match self.on_disk.reload(&self.dir) {
            Ok(Some(fresh)) => {
                self.on_disk = fresh;
                Some(&self.on_disk)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("Ignoring edited config: {err}");
                None
            }
        }
    }
}
