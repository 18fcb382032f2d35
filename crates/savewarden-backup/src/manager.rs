//! Backup manager façade.
//!
//! One manager owns one world's backup lifecycle. Each instance is
//! independent, with its own config, lock and cancellation scope; instances
//! must not point at overlapping directories (there is no cross-instance
//! coordination). Reconfiguration is expressed as "shut down the old
//! instance, construct and start a new one", never field mutation.

use crate::index::{list_save_files, Archive};
use crate::restore::restore_save;
use crate::retention::{plan_cleanup, RetentionPolicy};
use crate::store::{copy_durable, ensure_dir, is_save_file};
use crate::watch::{FsWatcher, SaveWatcher};
use camino::Utf8PathBuf;
use chrono::Utc;
use savewarden_core::{Error, Result, WardenConfig, DEFAULT_SETTLE_DELAY_SECS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long entries may linger in the transient autosave directory before the
/// sweep prunes them. The archive directory is unaffected.
const AUTOSAVE_MAX_AGE: Duration = Duration::from_secs(24 * 3600);

/// Immutable configuration of one [`BackupManager`] instance.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// World identifier, as the game server names it
    pub world: String,

    /// Directory the game server writes rotating autosaves into (watched)
    pub autosave_dir: Utf8PathBuf,

    /// Directory durable archive copies are kept in (source of truth)
    pub archive_dir: Utf8PathBuf,

    /// Path of the live save slot the server loads from
    pub save_slot: Utf8PathBuf,

    /// Delay between a create event and the archival copy
    pub settle_delay: Duration,

    /// Whether the periodic retention sweep runs
    pub cleanup_enabled: bool,

    /// Retention policy applied by the sweep
    pub retention: RetentionPolicy,
}

impl BackupConfig {
    /// Builds an engine config from a parsed savewarden.yaml.
    pub fn from_warden(config: &WardenConfig) -> Self {
        let days = |n: u64| Duration::from_secs(n * 24 * 3600);
        Self {
            world: config.world.clone(),
            autosave_dir: config.autosave_dir.clone(),
            archive_dir: config.archive_dir.clone(),
            save_slot: config.save_slot(),
            settle_delay: Duration::from_secs(config.settle_delay_secs()),
            cleanup_enabled: config.cleanup.enabled,
            retention: RetentionPolicy {
                keep_last_n: config.cleanup.keep_last_n,
                keep_daily_for: days(config.cleanup.keep_daily_for_days),
                keep_weekly_for: days(config.cleanup.keep_weekly_for_days),
                keep_monthly_for: days(config.cleanup.keep_monthly_for_days),
                cleanup_interval: Duration::from_secs(config.cleanup.interval_secs),
            },
        }
    }
}

/// Supervises archival, retention and restore for one world.
pub struct BackupManager {
    config: Arc<BackupConfig>,
    // List, sweep and restore serialize on this; the ingest copy step takes
    // it too, but the settle sleep happens outside it.
    lock: Arc<Mutex<()>>,
    cancel: CancellationToken,
    started: bool,
}

impl BackupManager {
    /// Creates a stopped manager. A zero settle delay is replaced with the
    /// default: copying an autosave the instant it appears risks archiving a
    /// partially-written file. A zero cleanup interval likewise falls back to
    /// the default, since the sweep ticker cannot run on a zero period.
    pub fn new(mut config: BackupConfig) -> Self {
        if config.settle_delay.is_zero() {
            config.settle_delay = Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS);
        }
        if config.retention.cleanup_interval.is_zero() {
            config.retention.cleanup_interval = RetentionPolicy::default().cleanup_interval;
        }
        Self {
            config: Arc::new(config),
            lock: Arc::new(Mutex::new(())),
            cancel: CancellationToken::new(),
            started: false,
        }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Creates the autosave and archive directories if absent.
    pub fn initialize(&self) -> Result<()> {
        ensure_dir(&self.config.autosave_dir)?;
        ensure_dir(&self.config.archive_dir)?;
        Ok(())
    }

    /// Starts the watch loop and, if enabled, the periodic retention sweep.
    pub fn start(&mut self) -> Result<()> {
        self.initialize()?;
        let watcher = FsWatcher::new(&self.config.autosave_dir)?;
        self.start_with_watcher(watcher)
    }

    /// Like [`start`](Self::start) but with a caller-supplied event source.
    /// Tests drive the ingest loop through a channel-backed watcher.
    pub fn start_with_watcher<W: SaveWatcher + 'static>(&mut self, watcher: W) -> Result<()> {
        if self.started {
            return Err(Error::invalid_config("backup manager already started"));
        }
        self.initialize()?;
        self.started = true;

        tokio::spawn(Self::watch_loop(
            self.config.clone(),
            self.lock.clone(),
            self.cancel.clone(),
            watcher,
        ));

        if self.config.cleanup_enabled {
            tokio::spawn(Self::sweep_loop(
                self.config.clone(),
                self.lock.clone(),
                self.cancel.clone(),
            ));
        }

        Ok(())
    }

    /// Cancels the background loops. Idempotent. In-flight settle-and-copy
    /// tasks run to completion so a half-copied archive is never left behind.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Lists archives newest-first. `limit` of 0 means all.
    pub async fn list_backups(&self, limit: usize) -> Result<Vec<Archive>> {
        let _guard = self.lock.lock().await;
        let mut saves = list_save_files(&self.config.archive_dir)?;
        saves.reverse();
        if limit > 0 && limit < saves.len() {
            saves.truncate(limit);
        }
        Ok(saves)
    }

    /// Restores the archive at `index` into the live save slot, holding the
    /// lock for the whole call. An out-of-range index fails with no side
    /// effects. The caller is expected to have stopped the game server.
    pub async fn restore_backup(&self, index: usize) -> Result<()> {
        let _guard = self.lock.lock().await;
        info!("restoring backup with index {index}");

        let saves = list_save_files(&self.config.archive_dir)?;
        let target = saves.get(index).ok_or(Error::InvalidBackupIndex {
            index,
            available: saves.len(),
        })?;

        restore_save(&target.path, &self.config.save_slot)?;
        info!("backup with index {index} restored successfully");
        Ok(())
    }

    /// Runs one retention sweep immediately.
    pub async fn sweep(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        Self::sweep_locked(&self.config)
    }

    async fn watch_loop(
        config: Arc<BackupConfig>,
        lock: Arc<Mutex<()>>,
        cancel: CancellationToken,
        mut watcher: impl SaveWatcher,
    ) {
        info!("starting save watcher for world {}", config.world);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = watcher.next_event() => {
                    let Some(event) = event else { break };
                    let Some(name) = event.path.file_name() else { continue };
                    if !is_save_file(name) {
                        continue;
                    }
                    debug!("new autosave detected: {}", event.path);
                    // Detached on purpose: a slow copy must not stall
                    // detection of subsequent autosaves, and shutdown lets
                    // in-flight copies finish.
                    tokio::spawn(Self::settle_and_archive(
                        config.clone(),
                        lock.clone(),
                        event.path,
                    ));
                }
            }
        }
        info!("save watcher stopped");
    }

    /// Waits out the settle delay, then copies the autosave into the archive
    /// directory. A failed copy is only logged: the next autosave cycle
    /// produces a fresh event, and overwriting makes repeats harmless.
    async fn settle_and_archive(
        config: Arc<BackupConfig>,
        lock: Arc<Mutex<()>>,
        path: Utf8PathBuf,
    ) {
        tokio::time::sleep(config.settle_delay).await;

        let _guard = lock.lock().await;
        let Some(name) = path.file_name() else { return };
        let destination = config.archive_dir.join(name);
        match copy_durable(&path, &destination) {
            Ok(()) => info!("archived {} -> {}", path, destination),
            Err(e) => warn!("failed to archive {}: {e}", path),
        }
    }

    async fn sweep_loop(
        config: Arc<BackupConfig>,
        lock: Arc<Mutex<()>>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(config.retention.cleanup_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately; the first sweep should wait one period
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let _guard = lock.lock().await;
                    if let Err(e) = Self::sweep_locked(&config) {
                        warn!("backup cleanup error: {e}");
                    }
                }
            }
        }
    }

    fn sweep_locked(config: &BackupConfig) -> Result<()> {
        let archives = list_save_files(&config.archive_dir)?;
        let deletions = plan_cleanup(&archives, &config.retention, Utc::now());
        if !deletions.is_empty() {
            info!(
                "retention sweep: deleting {} of {} archives",
                deletions.len(),
                archives.len()
            );
        }
        for archive in deletions {
            if let Err(e) = std::fs::remove_file(archive.path.as_std_path()) {
                // The stale file stays until the next sweep retries it.
                warn!("failed to delete backup file {}: {e}", archive.path);
            }
        }

        Self::prune_autosave_dir(config);
        Ok(())
    }

    /// Removes entries older than a day from the transient autosave
    /// directory. Mtime is fine here: this directory is never used for
    /// retention decisions, it is only mined for new files to ingest.
    fn prune_autosave_dir(config: &BackupConfig) {
        let entries = match std::fs::read_dir(config.autosave_dir.as_std_path()) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read autosave dir {}: {e}", config.autosave_dir);
                return;
            }
        };

        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else { continue };
            if !metadata.is_file() {
                continue;
            }
            let stale = metadata
                .modified()
                .ok()
                .and_then(|mtime| mtime.elapsed().ok())
                .is_some_and(|age| age > AUTOSAVE_MAX_AGE);
            if stale {
                if let Err(e) = std::fs::remove_file(entry.path()) {
                    warn!(
                        "failed to remove old autosave {}: {e}",
                        entry.path().display()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ticks_for, write_save_container};
    use crate::watch::CreateEvent;
    use chrono::{DateTime, TimeZone};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    struct World {
        _dir: TempDir,
        config: BackupConfig,
    }

    fn world(settle: Duration) -> World {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let config = BackupConfig {
            world: "mars-base".to_string(),
            autosave_dir: root.join("backup"),
            archive_dir: root.join("safebackups"),
            save_slot: root.join("mars-base.save"),
            settle_delay: settle,
            cleanup_enabled: false,
            retention: RetentionPolicy::default(),
        };
        World { _dir: dir, config }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn seed_archives(config: &BackupConfig, stamps: &[DateTime<Utc>]) {
        ensure_dir(&config.archive_dir).unwrap();
        for (i, stamp) in stamps.iter().enumerate() {
            write_save_container(
                &config.archive_dir.join(format!("s{i}.save")),
                ticks_for(*stamp),
            );
        }
    }

    #[tokio::test]
    async fn list_backups_is_newest_first_and_limited() {
        let world = world(Duration::from_millis(10));
        seed_archives(&world.config, &[at(1, 0), at(3, 0), at(2, 0)]);
        let manager = BackupManager::new(world.config.clone());

        let all = manager.list_backups(0).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].save_time, at(3, 0));
        assert_eq!(all[2].save_time, at(1, 0));
        // Indices still reflect the ascending order (oldest = 0)
        assert_eq!(all[0].index, 2);

        let limited = manager.list_backups(2).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].save_time, at(3, 0));
    }

    #[tokio::test]
    async fn restore_out_of_range_has_no_side_effects() {
        let world = world(Duration::from_millis(10));
        seed_archives(&world.config, &[at(1, 0)]);
        let manager = BackupManager::new(world.config.clone());
        std::fs::write(&world.config.save_slot, b"live").unwrap();

        let err = manager.restore_backup(5).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidBackupIndex {
                index: 5,
                available: 1
            }
        ));
        assert_eq!(std::fs::read(&world.config.save_slot).unwrap(), b"live");
    }

    #[tokio::test]
    async fn restore_round_trips_archive_bytes() {
        let world = world(Duration::from_millis(10));
        seed_archives(&world.config, &[at(1, 0), at(2, 0)]);
        let manager = BackupManager::new(world.config.clone());
        std::fs::write(&world.config.save_slot, b"current").unwrap();

        manager.restore_backup(0).await.unwrap();

        let archived = std::fs::read(world.config.archive_dir.join("s0.save")).unwrap();
        let live = std::fs::read(&world.config.save_slot).unwrap();
        assert_eq!(live, archived);
    }

    #[tokio::test]
    async fn ingest_archives_only_settled_content() {
        let world = world(Duration::from_millis(150));
        let mut manager = BackupManager::new(world.config.clone());
        let (tx, rx) = mpsc::unbounded_channel::<CreateEvent>();
        manager.start_with_watcher(rx).unwrap();

        let autosave = world.config.autosave_dir.join("mars-base(1).save");
        // Simulate the server still writing: partial content at event time,
        // final content rewritten within the settle window.
        std::fs::write(&autosave, b"partial").unwrap();
        tx.send(CreateEvent {
            path: autosave.clone(),
        })
        .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        std::fs::write(&autosave, b"final settled content").unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        let archived = world.config.archive_dir.join("mars-base(1).save");
        assert_eq!(
            std::fs::read(&archived).unwrap(),
            b"final settled content"
        );
        manager.shutdown();
    }

    #[tokio::test]
    async fn non_save_events_are_ignored() {
        let world = world(Duration::from_millis(20));
        let mut manager = BackupManager::new(world.config.clone());
        let (tx, rx) = mpsc::unbounded_channel::<CreateEvent>();
        manager.start_with_watcher(rx).unwrap();

        let stray = world.config.autosave_dir.join("debug.log");
        std::fs::write(&stray, b"log line").unwrap();
        tx.send(CreateEvent { path: stray }).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!world.config.archive_dir.join("debug.log").as_std_path().exists());
        manager.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_the_watch_loop_and_is_idempotent() {
        let world = world(Duration::from_millis(10));
        let mut manager = BackupManager::new(world.config.clone());
        let (tx, rx) = mpsc::unbounded_channel::<CreateEvent>();
        manager.start_with_watcher(rx).unwrap();

        manager.shutdown();
        manager.shutdown();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The loop exited and dropped its receiver
        assert!(tx
            .send(CreateEvent {
                path: world.config.autosave_dir.join("late.save"),
            })
            .is_err());
    }

    #[tokio::test]
    async fn sweep_applies_retention_and_spares_fresh_autosaves() {
        let mut world = world(Duration::from_millis(10));
        world.config.retention = RetentionPolicy {
            keep_last_n: 1,
            keep_daily_for: Duration::ZERO,
            keep_weekly_for: Duration::ZERO,
            keep_monthly_for: Duration::ZERO,
            ..RetentionPolicy::default()
        };
        seed_archives(&world.config, &[at(1, 0), at(2, 0), at(3, 0)]);
        let manager = BackupManager::new(world.config.clone());
        manager.initialize().unwrap();
        let fresh = world.config.autosave_dir.join("recent.save");
        std::fs::write(&fresh, b"fresh").unwrap();

        manager.sweep().await.unwrap();

        let left = manager.list_backups(0).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].save_time, at(3, 0));
        // A freshly-written autosave is not pruned
        assert!(fresh.as_std_path().exists());
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let world = world(Duration::from_millis(10));
        let mut manager = BackupManager::new(world.config.clone());
        let (_tx1, rx1) = mpsc::unbounded_channel::<CreateEvent>();
        let (_tx2, rx2) = mpsc::unbounded_channel::<CreateEvent>();
        manager.start_with_watcher(rx1).unwrap();
        assert!(manager.start_with_watcher(rx2).is_err());
        manager.shutdown();
    }

    #[test]
    fn zero_settle_delay_gets_the_default() {
        let world = world(Duration::ZERO);
        let manager = BackupManager::new(world.config.clone());
        assert_eq!(
            manager.config().settle_delay,
            Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS)
        );
    }

    #[tokio::test]
    async fn zero_cleanup_interval_gets_the_default() {
        // A zero period would panic the sweep ticker, so construction
        // normalizes it even when the config bypassed YAML validation.
        let mut world = world(Duration::from_millis(10));
        world.config.cleanup_enabled = true;
        world.config.retention.cleanup_interval = Duration::ZERO;

        let mut manager = BackupManager::new(world.config.clone());
        assert_eq!(
            manager.config().retention.cleanup_interval,
            RetentionPolicy::default().cleanup_interval
        );

        // The sweep loop spawns without panicking
        let (_tx, rx) = mpsc::unbounded_channel::<CreateEvent>();
        manager.start_with_watcher(rx).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.shutdown();
    }
}
