//! Polling-based config file watcher.
//!
//! Checks the config file's mtime every 2 seconds. When a change is detected,
//! debounces for 500ms (to handle partial writes from editors), then reloads
//! the file into the shared [`ConfigHandle`].

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;

use super::ConfigHandle;

/// Outcome of one reload attempt.
#[derive(Debug)]
pub enum ConfigEvent {
    /// New config is active.
    Reloaded,
    /// Reload failed; the previous config remains active.
    Error(String),
}

/// Interval between mtime checks.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Debounce delay after detecting a change (editors often write in stages).
const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Run the config file watcher until `cancel` fires.
pub async fn run_config_watcher(path: PathBuf, handle: ConfigHandle, cancel: CancellationToken) {
    tracing::info!(path = %path.display(), "Config watcher started");

    let mut last_mtime = get_mtime(&path);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Config watcher stopped");
                return;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }

        let current = match get_mtime(&path) {
            Some(t) => t,
            None => {
                // Only warn once per disappearance
                if last_mtime.is_some() {
                    tracing::warn!(
                        path = %path.display(),
                        "Config file not accessible, keeping current config"
                    );
                    last_mtime = None;
                }
                continue;
            }
        };

        if last_mtime == Some(current) {
            continue;
        }

        tokio::time::sleep(DEBOUNCE_DELAY).await;
        if get_mtime(&path) != Some(current) {
            // Still being written
            continue;
        }
        last_mtime = Some(current);

        match reload(&path, &handle) {
            ConfigEvent::Reloaded => {}
            ConfigEvent::Error(e) => {
                tracing::error!(error = %e, "Config hot-reload failed, keeping previous config");
            }
        }
    }
}

/// Reload `path` into `handle`.
pub fn reload(path: &Path, handle: &ConfigHandle) -> ConfigEvent {
    match handle.reload_from(path) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                site = %config.site.name,
                refresh_secs = config.dashboard.refresh_interval_secs,
                "Config reloaded"
            );
            ConfigEvent::Reloaded
        }
        Err(e) => ConfigEvent::Error(e.to_string()),
    }
}

fn get_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}
