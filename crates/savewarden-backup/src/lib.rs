//! Savewarden backup engine
//!
//! This crate watches a game server's autosave directory, copies settled save
//! containers into a durable archive directory, enforces a tiered retention
//! policy (last-N / daily / weekly / monthly), and restores archived saves
//! back into the live slot with crash-safe rollback.
//!
//! # Examples
//!
//! ```no_run
//! use savewarden_backup::{BackupConfig, BackupManager, RetentionPolicy};
//! use camino::Utf8PathBuf;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> savewarden_core::Result<()> {
//!     let config = BackupConfig {
//!         world: "mars-base".to_string(),
//!         autosave_dir: Utf8PathBuf::from("saves/mars-base/backup"),
//!         archive_dir: Utf8PathBuf::from("saves/mars-base/safebackups"),
//!         save_slot: Utf8PathBuf::from("saves/mars-base/mars-base.save"),
//!         settle_delay: Duration::from_secs(30),
//!         cleanup_enabled: true,
//!         retention: RetentionPolicy::default(),
//!     };
//!
//!     let mut manager = BackupManager::new(config);
//!     manager.start()?;
//!
//!     for archive in manager.list_backups(10).await? {
//!         println!("#{} {}", archive.index, archive.save_time);
//!     }
//!
//!     manager.shutdown();
//!     Ok(())
//! }
//! ```

pub mod index;
pub mod manager;
pub mod metadata;
pub mod restore;
pub mod retention;
pub mod store;
pub mod watch;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use index::{list_save_files, Archive};
pub use manager::{BackupConfig, BackupManager};
pub use metadata::{read_save_time, FILETIME_EPOCH_OFFSET};
pub use restore::restore_save;
pub use retention::{plan_cleanup, RetentionPolicy};
pub use store::{copy_durable, ensure_dir, is_save_file};
pub use watch::{CreateEvent, FsWatcher, SaveWatcher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
