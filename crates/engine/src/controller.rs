//! One maintenance run, start to finish: take the lock, place a finished
//! torrent if the daemon told us about one, then clean, evict, and resume.

use transmission::TransClient;

use crate::activity::ActivityLog;
use crate::config::Config;
use crate::lock::RunLock;
use crate::placer::Placer;
use crate::storage::{self, Cleaner, QuotaEngine};
use crate::Result;

const LOCK_FILE: &str = "seedwarden.lock";

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report every action without touching the daemon or the filesystem.
    pub dry_run: bool,
}

/// The daemon's script hook exports `TR_TORRENT_ID` (and friends); its
/// presence selects torrent-done mode.
pub fn torrent_done_from_env() -> Option<i64> {
    std::env::var("TR_TORRENT_ID").ok()?.trim().parse().ok()
}

/// Run one tick. Returns an error only for setup and lock failures; a step
/// failing mid-tick is logged and the remaining steps still run.
pub async fn run(config: &Config, options: RunOptions) -> Result<()> {
    let torrent_id = torrent_done_from_env();
    let lock_path = std::env::temp_dir().join(LOCK_FILE);
    // A torrent-done callback must not be dropped; a plain tick yields.
    let Some(_lock) = RunLock::acquire(&lock_path, torrent_id.is_some())? else {
        tracing::info!("another run is in progress; skipping this tick");
        return Ok(());
    };

    let mut activity = ActivityLog::new(config.log_file.clone());
    let client = TransClient::new(
        config.endpoint(),
        config.rpc_username(),
        config.rpc_password(),
    );

    if let Some(id) = torrent_id {
        tracing::debug!(id, "torrent-done callback");
        Placer {
            client: &client,
            config,
            dry_run: options.dry_run,
        }
        .process_done(id, &mut activity)
        .await;
    }

    match client.torrent_get(storage::INVENTORY_FIELDS, None).await {
        Ok(torrents) => {
            let inventory = storage::build_inventory(torrents, &config.seed_dir);

            Cleaner {
                seed_dir: &config.seed_dir,
                watch_dir: config.watch_dir(),
                dry_run: options.dry_run,
            }
            .run(&inventory.allowed);

            let quota = QuotaEngine {
                client: &client,
                seed_dir: &config.seed_dir,
                quota: config.quota_bytes(),
                dry_run: options.dry_run,
            };
            if let Err(err) = quota.enforce(&inventory, None, &mut activity).await {
                tracing::error!(error = %err, "quota enforcement failed");
            }

            if inventory.torrents.iter().any(|t| t.status.is_stopped()) {
                if options.dry_run {
                    tracing::info!("would resume paused torrents");
                } else if let Err(err) = client.torrent_start().await {
                    tracing::error!(error = %err, "resume failed");
                }
            }
        }
        Err(err) => tracing::error!(error = %err, "inventory fetch failed"),
    }

    if let Err(err) = activity.flush() {
        tracing::error!(error = %err, "failed to write activity log");
    }
    Ok(())
}
