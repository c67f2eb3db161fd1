//! Core type system and error handling for dirsync
//!
//! This crate provides the foundational types shared by every dirsync crate:
//!
//! - **Error handling**: a single error enum with kinds, severity levels and recoverability
//! - **Core types**: relative paths, sync endpoints, content hashes and pass statistics
//! - **Traits**: the async log sink consumed by the synchronization engine
//! - **Configuration**: validated value types such as the sync interval
//!
//! # Features
//!
//! - `async`: Enable async trait definitions
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use dirsync_types::{ActionKind, PassStats, RelativePath, Result};
//!
//! fn example_operation() -> Result<PassStats> {
//!     let path = RelativePath::new("docs/readme.txt")?;
//!     assert_eq!(path.to_string(), "docs/readme.txt");
//!
//!     let mut stats = PassStats::new();
//!     stats.record(ActionKind::CopyFile, true);
//!     Ok(stats)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
#[cfg(feature = "async")]
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{HashAlgorithm, SyncInterval};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
#[cfg(feature = "async")]
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_stats_creation() {
        let stats = PassStats::new();
        assert_eq!(stats.total_planned(), 0);
        assert_eq!(stats.failed, 0);
        assert!(stats.is_clean());
    }

    #[test]
    fn test_pass_stats_merge() {
        let mut stats1 = PassStats::new();
        stats1.record(ActionKind::CopyFile, true);
        stats1.record(ActionKind::DeleteFile, false);

        let mut stats2 = PassStats::new();
        stats2.record(ActionKind::MoveFile, true);

        stats1.merge(&stats2);
        assert_eq!(stats1.files_copied, 1);
        assert_eq!(stats1.files_moved, 1);
        assert_eq!(stats1.failed, 1);
        assert_eq!(stats1.total_planned(), 3);
    }

    #[test]
    fn test_error_severity() {
        let io_error = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "test"));
        assert_eq!(io_error.severity(), ErrorSeverity::Medium);

        let config_error = Error::config("invalid config");
        assert_eq!(config_error.severity(), ErrorSeverity::Critical);
        assert!(!config_error.is_recoverable());
    }

    #[test]
    fn test_sync_interval_validation() {
        assert!(SyncInterval::from_minutes(1).is_ok());
        assert!(SyncInterval::from_minutes(30).is_ok());
        assert!(SyncInterval::from_minutes(0).is_err());
    }
}
