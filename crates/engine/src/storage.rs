//! Seed-space bookkeeping: the inventory snapshot, orphan cleanup, and
//! quota-driven eviction.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use transmission::{Torrent, TransClient};

use crate::activity::{ActivityKind, ActivityLog};
use crate::error::EngineError;
use crate::util::{self, humansize};
use crate::Result;

/// Entries are deleted in bounded batches.
const DELETE_BATCH: usize = 100;

/// The fields the maintenance passes need from `torrent-get`.
pub const INVENTORY_FIELDS: &[&str] = &[
    "id",
    "name",
    "downloadDir",
    "percentDone",
    "sizeWhenDone",
    "status",
    "activityDate",
];

/// One `torrent-get` snapshot, annotated with what lives in seed-dir.
pub struct Inventory {
    pub torrents: Vec<Torrent>,
    /// First path segments under seed-dir that belong to known torrents.
    pub allowed: HashSet<String>,
    /// Ids of torrents whose download dir is (inside) seed-dir.
    pub seed_ids: HashSet<i64>,
    /// Summed `sizeWhenDone` of those torrents.
    pub seed_total: u64,
}

impl Inventory {
    pub fn seed_torrents(&self) -> impl Iterator<Item = &Torrent> {
        self.torrents
            .iter()
            .filter(|torrent| self.seed_ids.contains(&torrent.id))
    }
}

/// Annotate a torrent list against the seed directory. A torrent counts as
/// seed-dir resident when its canonicalized download dir is seed-dir or a
/// subdirectory of it; for subdirectories the first segment below seed-dir
/// is what the Cleaner must leave alone.
pub fn build_inventory(torrents: Vec<Torrent>, seed_dir: &Path) -> Inventory {
    let seed = util::locate(seed_dir);
    let mut allowed = HashSet::new();
    let mut seed_ids = HashSet::new();
    let mut seed_total = 0;

    for torrent in &torrents {
        let dir = util::locate(Path::new(&torrent.download_dir));
        if !util::is_within(&dir, &seed) {
            continue;
        }
        let first_segment = dir
            .strip_prefix(&seed)
            .ok()
            .and_then(|rest| rest.iter().next())
            .and_then(|segment| segment.to_str());
        allowed.insert(
            first_segment
                .map(str::to_owned)
                .unwrap_or_else(|| torrent.name.clone()),
        );
        seed_ids.insert(torrent.id);
        seed_total += torrent.size_when_done;
    }

    Inventory {
        torrents,
        allowed,
        seed_ids,
        seed_total,
    }
}

/// True when a seed-dir entry corresponds to no known torrent. Dotfiles and
/// the daemon's own bookkeeping entries (`#`, `@` prefixes) are never
/// touched, and an in-progress `name.part` file belongs to `name`.
fn is_orphan(name: &str, is_file: bool, allowed: &HashSet<String>) -> bool {
    if name.starts_with(['.', '#', '@']) {
        return false;
    }
    if allowed.contains(name) {
        return false;
    }
    if is_file {
        if let Some(stripped) = name.strip_suffix(".part") {
            if allowed.contains(stripped) {
                return false;
            }
        }
    }
    true
}

pub struct Cleaner<'a> {
    pub seed_dir: &'a Path,
    pub watch_dir: Option<&'a Path>,
    pub dry_run: bool,
}

impl Cleaner<'_> {
    pub fn run(&self, allowed: &HashSet<String>) {
        self.clean_seed_dir(allowed);
        if let Some(watch_dir) = self.watch_dir {
            self.clean_watch_dir(watch_dir);
        }
    }

    fn clean_seed_dir(&self, allowed: &HashSet<String>) {
        let entries = match std::fs::read_dir(self.seed_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(dir = %self.seed_dir.display(), %err, "cannot scan seed-dir");
                return;
            }
        };
        let mut obsolete = Vec::new();
        for entry in entries.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_orphan(&name, is_file, allowed) {
                obsolete.push(entry.path());
            }
        }
        self.delete_batched("seed-dir", &obsolete);
    }

    fn clean_watch_dir(&self, watch_dir: &Path) {
        let entries = match std::fs::read_dir(watch_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(dir = %watch_dir.display(), %err, "cannot scan watch-dir");
                return;
            }
        };
        let mut obsolete = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_torrent = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("torrent"));
            if !is_torrent {
                continue;
            }
            match entry.metadata() {
                Ok(meta) if meta.is_file() && meta.len() == 0 => obsolete.push(path),
                Ok(_) => {}
                Err(err) => tracing::error!(path = %path.display(), %err, "cannot stat"),
            }
        }
        self.delete_batched("watch-dir", &obsolete);
    }

    fn delete_batched(&self, which: &str, obsolete: &[PathBuf]) {
        for batch in obsolete.chunks(DELETE_BATCH) {
            tracing::debug!(which, count = batch.len(), "cleanup batch");
            for path in batch {
                if self.dry_run {
                    tracing::info!("cleanup {which} (dry-run): {}", path.display());
                    continue;
                }
                tracing::info!("cleanup {which}: {}", path.display());
                let result = if path.is_dir() {
                    std::fs::remove_dir_all(path)
                } else {
                    std::fs::remove_file(path)
                };
                if let Err(err) = result {
                    tracing::error!(path = %path.display(), %err, "cleanup failed");
                }
            }
        }
    }
}

/// How many bytes eviction must reclaim. `quota` doubles as the free-space
/// reserve: the engine keeps the torrent footprint under what the disk can
/// hold next to the reserve, and keeps at least the reserve free.
fn bytes_to_free(quota: u64, seed_total: u64, disk_total: u64, disk_free: u64) -> u64 {
    let by_capacity = quota as i128 + seed_total as i128 - disk_total as i128;
    let by_reserve = quota as i128 - disk_free as i128;
    by_capacity.max(by_reserve).max(0) as u64
}

/// Pick eviction victims: completed, settled torrents, least recently
/// active first, stopping at the first prefix whose sizes cover `target`.
fn select_victims<'a>(candidates: impl IntoIterator<Item = &'a Torrent>, target: u64) -> Vec<i64> {
    let mut list: Vec<_> = candidates
        .into_iter()
        .filter(|t| t.percent_done >= 1.0 && t.status.is_settled())
        .collect();
    list.sort_by_key(|t| t.activity_date);

    let mut victims = Vec::new();
    let mut reclaimed = 0;
    for torrent in list {
        victims.push(torrent.id);
        reclaimed += torrent.size_when_done;
        if reclaimed >= target {
            break;
        }
    }
    victims
}

pub struct QuotaEngine<'a> {
    pub client: &'a TransClient,
    pub seed_dir: &'a Path,
    /// Quota in bytes; 0 disables eviction in practice.
    pub quota: u64,
    pub dry_run: bool,
}

impl QuotaEngine<'_> {
    /// Evict the least valuable torrents until the seed space fits the
    /// quota again. `projected_add` accounts for a payload about to be
    /// copied into seed-dir.
    pub async fn enforce(
        &self,
        inventory: &Inventory,
        projected_add: Option<u64>,
        activity: &mut ActivityLog,
    ) -> Result<()> {
        let stats =
            fs2::statvfs(self.seed_dir).map_err(|err| EngineError::io(self.seed_dir, err))?;
        let mut free = stats.free_space();
        let mut seed_total = inventory.seed_total;
        if let Some(add) = projected_add {
            free = free.saturating_sub(add);
            seed_total += add;
        }

        let target = bytes_to_free(self.quota, seed_total, stats.total_space(), free);
        if target == 0 {
            tracing::debug!("no need to free up space");
            return Ok(());
        }
        tracing::info!("storage limits exceeded by {}", humansize(target));

        let victims = select_victims(inventory.seed_torrents(), target);
        if victims.is_empty() {
            tracing::warn!("no suitable torrents found for removal");
            return Ok(());
        }

        if !self.dry_run {
            self.client.torrent_remove(&victims, true).await?;
        }
        let by_id: std::collections::HashMap<i64, &Torrent> =
            inventory.torrents.iter().map(|t| (t.id, t)).collect();
        for id in &victims {
            if let Some(torrent) = by_id.get(id) {
                activity.push(
                    ActivityKind::Remove,
                    torrent.name.clone(),
                    humansize(torrent.size_when_done),
                );
            }
        }
        Ok(())
    }
}
