//! Error types and handling for dirsync
//!
//! This module provides the error taxonomy shared by the scanner, comparator,
//! planner and executor. Errors carry a kind and a severity level. The
//! scheduler logs failed passes at a level derived from the severity and stops
//! retrying once an error is not recoverable.

use std::path::{Path, PathBuf};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Medium severity - the condition is usually transient
    Medium,
    /// High severity - the pass is aborted, a later pass may succeed
    High,
    /// Critical severity - no later pass can succeed without operator action
    Critical,
}

/// Main error type for dirsync operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// A sync root (source or destination) is missing or not a directory
    #[error("Directory {path} does not exist")]
    RootMissing {
        /// Path to the missing root
        path: PathBuf,
    },

    /// File not found
    #[error("File {path} not found")]
    FileNotFound {
        /// Path to the file that was not found
        path: PathBuf,
    },

    /// Permission denied
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// Path to the file with permission issues
        path: PathBuf,
    },

    /// A path could not be expressed relative to its tree root
    #[error("Invalid relative path '{path}': {reason}")]
    InvalidPath {
        /// Offending path
        path: PathBuf,
        /// Why the path was rejected
        reason: String,
    },

    /// Source and destination are the same directory or one contains the other
    #[error("Source {source_root} and destination {destination_root} overlap")]
    OverlappingRoots {
        /// Source root as given
        source_root: PathBuf,
        /// Destination root as given
        destination_root: PathBuf,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Setup errors (missing or overlapping roots)
    Setup,
    /// Path normalization errors
    Path,
    /// Configuration errors
    Config,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::FileNotFound { .. } | Self::PermissionDenied { .. } => {
                ErrorKind::Io
            }
            Self::RootMissing { .. } | Self::OverlappingRoots { .. } => ErrorKind::Setup,
            Self::InvalidPath { .. } => ErrorKind::Path,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } | Self::FileNotFound { .. } => ErrorSeverity::Medium,
            Self::RootMissing { .. } | Self::PermissionDenied { .. } | Self::InvalidPath { .. } => {
                ErrorSeverity::High
            }
            Self::OverlappingRoots { .. } | Self::Config { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether a later pass can succeed without operator action
    ///
    /// A missing root may reappear and a vanished file is gone by the next
    /// scan, so both are recoverable. Overlapping roots and bad configuration
    /// never fix themselves.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Map an I/O error raised while operating on `path`
    ///
    /// `NotFound` and `PermissionDenied` keep the path; everything else is
    /// flattened into [`Error::Io`] with `operation` as context.
    pub fn io_at(operation: &str, path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                message: format!("Failed to {} '{}': {}", operation, path.display(), error),
            },
        }
    }

    /// Create a new missing-root error
    pub fn root_missing<P: Into<PathBuf>>(path: P) -> Self {
        Self::RootMissing { path: path.into() }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    proptest! {
        #[test]
        fn test_error_kind_consistency(
            message in ".*"
        ) {
            let errors = vec![
                Error::Io { message: message.clone() },
                Error::Config { message: message.clone() },
                Error::InvalidPath { path: PathBuf::from("x"), reason: message.clone() },
            ];

            for error in errors {
                let kind = error.kind();
                match error {
                    Error::Io { .. } => prop_assert_eq!(kind, ErrorKind::Io),
                    Error::Config { .. } => prop_assert_eq!(kind, ErrorKind::Config),
                    Error::InvalidPath { .. } => prop_assert_eq!(kind, ErrorKind::Path),
                    _ => {}
                }
            }
        }

        #[test]
        fn test_recoverability_follows_severity(
            message in ".*"
        ) {
            for error in [Error::Io { message: message.clone() }, Error::config(message)] {
                prop_assert_eq!(
                    error.is_recoverable(),
                    error.severity() < ErrorSeverity::Critical
                );
            }
        }
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_root_missing_error() {
        let error = Error::root_missing("/nonexistent/root");

        assert_eq!(error.kind(), ErrorKind::Setup);
        assert_eq!(error.severity(), ErrorSeverity::High);
        assert!(error.is_recoverable());
        assert!(error.to_string().contains("/nonexistent/root"));
    }

    #[test]
    fn test_overlapping_roots_error() {
        let error = Error::OverlappingRoots {
            source_root: PathBuf::from("/a/b"),
            destination_root: PathBuf::from("/a"),
        };

        assert_eq!(error.kind(), ErrorKind::Setup);
        assert!(!error.is_recoverable());
        assert_eq!(error.to_string(), "Source /a/b and destination /a overlap");
    }

    #[test]
    fn test_file_not_found_error() {
        let path = PathBuf::from("/nonexistent/file.txt");
        let error = Error::FileNotFound { path };

        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(error.severity(), ErrorSeverity::Medium);
        assert!(error.is_recoverable());
        assert!(error.to_string().contains("/nonexistent/file.txt"));
    }

    #[test]
    fn test_io_at_keeps_path_for_not_found() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = Error::io_at("hash", Path::new("/tmp/a.txt"), io_error);

        assert!(matches!(error, Error::FileNotFound { ref path } if path == Path::new("/tmp/a.txt")));
    }

    #[test]
    fn test_io_at_flattens_other_errors() {
        let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let error = Error::io_at("copy", Path::new("/tmp/a.txt"), io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        let message = error.to_string();
        assert!(message.contains("Failed to copy"));
        assert!(message.contains("disk on fire"));
    }
}
