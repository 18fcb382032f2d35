//! # savewarden-core
//!
//! Core library for the Savewarden CLI providing:
//! - Configuration file parsing (savewarden.yaml)
//! - Error taxonomy shared by the backup engine and its callers

pub mod config;
pub mod error;

pub use config::{CleanupConfig, WardenConfig, DEFAULT_SETTLE_DELAY_SECS};
pub use error::{Error, Result};
