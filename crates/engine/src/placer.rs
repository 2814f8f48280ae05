//! Post-completion placement: categorize a finished torrent and copy it to
//! its destination, or relocate an externally downloaded payload into the
//! seed directory and tell the daemon about it.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use categorizer::{Categorizer, Category, Record};
use tokio::io::AsyncWriteExt;
use transmission::{Torrent, TransClient};

use crate::activity::{ActivityKind, ActivityLog};
use crate::config::Config;
use crate::error::EngineError;
use crate::fsops;
use crate::storage::{self, QuotaEngine};
use crate::util::{self, humansize};
use crate::Result;

const DONE_FIELDS: &[&str] = &[
    "id",
    "name",
    "downloadDir",
    "files",
    "percentDone",
    "sizeWhenDone",
    "status",
];

/// How often the daemon is polled while it finishes writing the payload.
const DONE_RETRIES: u32 = 10;

pub struct Placer<'a> {
    pub client: &'a TransClient,
    pub config: &'a Config,
    pub dry_run: bool,
}

impl Placer<'_> {
    /// Handle one finished torrent. Failures end up in the activity log as
    /// `Error` records; the maintenance tick carries on regardless.
    pub async fn process_done(&self, id: i64, activity: &mut ActivityLog) {
        if let Err(err) = self.place(id, activity).await {
            tracing::error!(id, error = %err, "placement failed");
            activity.push(ActivityKind::Error, format!("torrent {id}"), err.to_string());
        }
    }

    async fn place(&self, id: i64, activity: &mut ActivityLog) -> Result<()> {
        let torrent = self.wait_until_done(id).await?;
        let name = torrent.name.clone();
        let download_dir = PathBuf::from(&torrent.download_dir);
        let src = download_dir.join(&name);
        let seed_dir = &self.config.seed_dir;
        let in_seed = util::is_within(&util::locate(&download_dir), &util::locate(seed_dir));

        if in_seed {
            // Already seeding from the right place; copy a categorized
            // duplicate out for consumption.
            let category = self.categorize(&torrent).await;
            tracing::info!(name = %name, category = %category, "categorized");
            let dest_root = self.config.destinations.for_category(category);
            let dest_dir = if src.is_dir() {
                dest_root.to_path_buf()
            } else {
                dest_root.join(util::stem(&name))
            };
            let dest = dest_dir.join(&name);
            self.copy(&src, &dest, torrent.size_when_done).await?;
            activity.push(ActivityKind::Finish, name, dest_dir.display().to_string());
        } else {
            // Downloaded elsewhere; make room, pull the payload into
            // seed-dir, and point the daemon at it.
            let torrents = self
                .client
                .torrent_get(storage::INVENTORY_FIELDS, None)
                .await?;
            let inventory = storage::build_inventory(torrents, seed_dir);
            QuotaEngine {
                client: self.client,
                seed_dir,
                quota: self.config.quota_bytes(),
                dry_run: self.dry_run,
            }
            .enforce(&inventory, Some(torrent.size_when_done), activity)
            .await?;

            let dest = seed_dir.join(&name);
            self.copy(&src, &dest, torrent.size_when_done).await?;
            if !self.dry_run {
                self.client
                    .torrent_set_location(&[id], &seed_dir.to_string_lossy(), false)
                    .await?;
            }
            activity.push(ActivityKind::Finish, name, seed_dir.display().to_string());
        }
        Ok(())
    }

    /// Fetch the torrent, waiting out the daemon's final write-back if the
    /// callback fired slightly early.
    async fn wait_until_done(&self, id: i64) -> Result<Torrent> {
        for attempt in 0..=DONE_RETRIES {
            let torrent = self.client.torrent_get_one(DONE_FIELDS, id).await?;
            if torrent.percent_done >= 1.0 {
                return Ok(torrent);
            }
            tracing::debug!(id, attempt, percent = torrent.percent_done, "not done yet");
            if attempt < DONE_RETRIES {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
        Err(EngineError::NotReady(id))
    }

    async fn copy(&self, src: &std::path::Path, dest: &std::path::Path, size: u64) -> Result<()> {
        tracing::info!(
            "copy \"{}\" -> \"{}\" ({})",
            src.display(),
            dest.display(),
            humansize(size)
        );
        if self.dry_run {
            return Ok(());
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|err| EngineError::io(parent, err))?;
        }
        let (src, dest) = (src.to_path_buf(), dest.to_path_buf());
        let stats = tokio::task::spawn_blocking(move || fsops::copy_recursive(&src, &dest))
            .await
            .map_err(|err| EngineError::Setup(format!("copy task failed: {err}")))??;
        tracing::info!(
            files = stats.files,
            skipped = stats.skipped,
            bytes = stats.bytes,
            "copy finished"
        );
        Ok(())
    }

    /// Categorize with the configured external program or the built-in
    /// classifier. Any failure demotes the torrent to `default` rather than
    /// blocking placement.
    async fn categorize(&self, torrent: &Torrent) -> Category {
        match self.try_categorize(torrent).await {
            Ok(category) => category,
            Err(err) => {
                tracing::warn!(error = %err, "categorization failed, using default");
                Category::Default
            }
        }
    }

    async fn try_categorize(&self, torrent: &Torrent) -> Result<Category> {
        if !self.config.categorizer_program.as_os_str().is_empty() {
            return self.run_external_categorizer(torrent).await;
        }
        let categorizer = Categorizer::from_pattern_file(&self.config.regex_file)?;
        let records: Vec<Record> = torrent
            .files
            .iter()
            .map(|file| Record::new(file.name.clone(), file.length))
            .collect();
        Ok(categorizer.classify(&records)?)
    }

    /// Drive the external classifier over its NUL-delimited stdin contract.
    async fn run_external_categorizer(&self, torrent: &Torrent) -> Result<Category> {
        let program = &self.config.categorizer_program;
        let mut input = Vec::new();
        for file in &torrent.files {
            input.extend_from_slice(file.name.as_bytes());
            input.push(0);
            input.extend_from_slice(file.length.to_string().as_bytes());
            input.push(0);
        }

        let mut child = tokio::process::Command::new(program)
            .arg(&self.config.regex_file)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| EngineError::io(program, err))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .map_err(|err| EngineError::io(program, err))?;
        }
        let output = child
            .wait_with_output()
            .await
            .map_err(|err| EngineError::io(program, err))?;
        if !output.status.success() {
            return Err(EngineError::Setup(format!(
                "categorizer program exited with {}",
                output.status
            )));
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .map_err(EngineError::Setup)
    }
}
