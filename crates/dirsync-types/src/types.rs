//! Core data types for dirsync
//!
//! This module provides the data model used throughout the synchronization
//! engine: tree-relative paths, the validated source/destination pair, file
//! snapshots, content digests and per-pass statistics.

use crate::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

/// A path expressed relative to its tree root
///
/// Relative paths are the join key between the source and destination trees.
/// They hold only normal components, compare case-sensitively component by
/// component, and always display with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// Create a relative path, rejecting absolute paths and `..` segments
    ///
    /// `.` segments are dropped.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "parent directory segments are not allowed".to_string(),
                    })
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "path must be relative".to_string(),
                    })
                }
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "path is empty".to_string(),
            });
        }

        Ok(Self(normalized))
    }

    /// Express `full` relative to `root`
    pub fn from_root<P: AsRef<Path>, Q: AsRef<Path>>(root: P, full: Q) -> Result<Self> {
        let root = root.as_ref();
        let full = full.as_ref();
        let stripped = full.strip_prefix(root).map_err(|_| Error::InvalidPath {
            path: full.to_path_buf(),
            reason: format!("not located under '{}'", root.display()),
        })?;
        Self::new(stripped)
    }

    /// Borrow the underlying path
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Join this relative path onto a tree root
    pub fn resolve<P: AsRef<Path>>(&self, root: P) -> PathBuf {
        root.as_ref().join(&self.0)
    }

    /// Number of components
    pub fn depth(&self) -> usize {
        self.0.components().count()
    }

    /// Relative path of the containing directory, if any
    pub fn parent(&self) -> Option<Self> {
        self.0
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(|parent| Self(parent.to_path_buf()))
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, component) in self.0.components().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", component.as_os_str().to_string_lossy())?;
        }
        Ok(())
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Validated source and destination roots for one pass
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncEndpoint {
    source: PathBuf,
    destination: PathBuf,
}

impl SyncEndpoint {
    /// Create an endpoint
    ///
    /// Fails if either root is not an existing directory, or if the two roots
    /// are the same directory or nested inside one another.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(source: P, destination: Q) -> Result<Self> {
        let endpoint = Self {
            source: source.into(),
            destination: destination.into(),
        };
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// Re-check that both roots still exist and stay apart
    ///
    /// Roots can disappear or be relinked between passes, so this runs at the
    /// start of each one. Overlap is checked on canonical paths so symlinked
    /// or `..`-laden spellings of the same directory are caught.
    pub fn validate(&self) -> Result<()> {
        let source = canonical_root(&self.source)?;
        let destination = canonical_root(&self.destination)?;

        // Nested roots would make one tree's contents part of the other's
        if source.starts_with(&destination) || destination.starts_with(&source) {
            return Err(Error::OverlappingRoots {
                source_root: self.source.clone(),
                destination_root: self.destination.clone(),
            });
        }
        Ok(())
    }

    /// Source root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination root
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(Error::root_missing(root));
    }
    root.canonicalize().map_err(|_| Error::root_missing(root))
}

/// Size and modification time of a file, captured at plan time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSnapshot {
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
}

/// 128-bit digest of a file's full content
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Upper-case hexadecimal rendering
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{:02X}", byte)).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The five kinds of filesystem mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActionKind {
    /// Create a directory
    CreateDirectory,
    /// Recursively delete a directory
    DeleteDirectory,
    /// Rename a file within the destination tree
    MoveFile,
    /// Delete a file
    DeleteFile,
    /// Copy a file from the source tree, overwriting
    CopyFile,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateDirectory => "create-dir",
            Self::DeleteDirectory => "delete-dir",
            Self::MoveFile => "move",
            Self::DeleteFile => "delete",
            Self::CopyFile => "copy",
        };
        f.write_str(name)
    }
}

/// Result of executing one action
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionOutcome {
    /// Kind of the executed action
    pub kind: ActionKind,
    /// Human-readable description of what happened
    pub message: String,
    /// Whether the action succeeded
    pub success: bool,
}

impl ActionOutcome {
    /// Successful outcome
    pub fn succeeded<S: Into<String>>(kind: ActionKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            success: true,
        }
    }

    /// Failed outcome
    pub fn failed<S: Into<String>>(kind: ActionKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            success: false,
        }
    }
}

/// Statistics for one synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PassStats {
    /// Directories created
    pub directories_created: u64,
    /// Directories deleted
    pub directories_deleted: u64,
    /// Files copied (new or updated)
    pub files_copied: u64,
    /// Files moved inside the destination
    pub files_moved: u64,
    /// Files deleted
    pub files_deleted: u64,
    /// Actions that failed
    pub failed: u64,
    /// Failed actions broken down by kind
    pub failed_by_kind: BTreeMap<ActionKind, u64>,
    /// Total duration of the pass
    pub duration: Duration,
}

impl PassStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one action
    pub fn record(&mut self, kind: ActionKind, success: bool) {
        if !success {
            self.failed += 1;
            *self.failed_by_kind.entry(kind).or_insert(0) += 1;
            return;
        }
        match kind {
            ActionKind::CreateDirectory => self.directories_created += 1,
            ActionKind::DeleteDirectory => self.directories_deleted += 1,
            ActionKind::MoveFile => self.files_moved += 1,
            ActionKind::DeleteFile => self.files_deleted += 1,
            ActionKind::CopyFile => self.files_copied += 1,
        }
    }

    /// Number of failed actions of one kind
    pub fn failed_of(&self, kind: ActionKind) -> u64 {
        self.failed_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Number of actions that succeeded
    pub fn succeeded(&self) -> u64 {
        self.directories_created
            + self.directories_deleted
            + self.files_copied
            + self.files_moved
            + self.files_deleted
    }

    /// Number of actions executed, successful or not
    pub fn total_planned(&self) -> u64 {
        self.succeeded() + self.failed
    }

    /// Whether no action failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Merge statistics from another instance
    pub fn merge(&mut self, other: &PassStats) {
        self.directories_created += other.directories_created;
        self.directories_deleted += other.directories_deleted;
        self.files_copied += other.files_copied;
        self.files_moved += other.files_moved;
        self.files_deleted += other.files_deleted;
        self.failed += other.failed;
        for (kind, count) in &other.failed_by_kind {
            *self.failed_by_kind.entry(*kind).or_insert(0) += count;
        }
        self.duration += other.duration;
    }
}

impl fmt::Display for PassStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dirs created, {} dirs deleted, {} copied, {} moved, {} deleted, {} failed",
            self.directories_created,
            self.directories_deleted,
            self.files_copied,
            self.files_moved,
            self.files_deleted,
            self.failed
        )?;
        if !self.failed_by_kind.is_empty() {
            let breakdown: Vec<String> = self
                .failed_by_kind
                .iter()
                .map(|(kind, count)| format!("{} {}", count, kind))
                .collect();
            write!(f, " ({})", breakdown.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_path_normalizes_cur_dir() {
        let path = RelativePath::new("./a/./b.txt").unwrap();
        assert_eq!(path.to_string(), "a/b.txt");
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn test_relative_path_rejects_parent_segments() {
        let error = RelativePath::new("a/../b").unwrap_err();
        assert!(matches!(error, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_relative_path_rejects_absolute() {
        assert!(RelativePath::new("/etc/passwd").is_err());
        assert!(RelativePath::new("").is_err());
    }

    #[test]
    fn test_relative_path_from_root() {
        let root = Path::new("/data/src");
        let path = RelativePath::from_root(root, "/data/src/dir/file.txt").unwrap();
        assert_eq!(path.to_string(), "dir/file.txt");
        assert_eq!(path.resolve("/data/dst"), PathBuf::from("/data/dst/dir/file.txt"));
        assert!(RelativePath::from_root(root, "/elsewhere/file.txt").is_err());
    }

    #[test]
    fn test_relative_path_is_case_sensitive() {
        let lower = RelativePath::new("readme.txt").unwrap();
        let upper = RelativePath::new("README.txt").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_relative_path_parent() {
        let path = RelativePath::new("a/b/c.txt").unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "a/b");
        assert!(RelativePath::new("top.txt").unwrap().parent().is_none());
    }

    proptest! {
        #[test]
        fn test_relative_path_display_round_trips(
            parts in proptest::collection::vec("[a-zA-Z0-9_]{1,8}", 1..5)
        ) {
            let joined = parts.join("/");
            let path = RelativePath::new(&joined).unwrap();
            prop_assert_eq!(path.to_string(), joined);
            prop_assert_eq!(path.depth(), parts.len());
        }
    }

    #[test]
    fn test_endpoint_validation() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let endpoint = SyncEndpoint::new(src.path(), dst.path()).unwrap();
        assert_eq!(endpoint.source(), src.path());

        let missing = dst.path().join("missing");
        let error = SyncEndpoint::new(src.path(), &missing).unwrap_err();
        assert!(matches!(error, Error::RootMissing { ref path } if *path == missing));
    }

    #[test]
    fn test_endpoint_revalidation_detects_removed_root() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let endpoint = SyncEndpoint::new(src.path(), dst.path()).unwrap();

        let src_path = src.path().to_path_buf();
        drop(src);

        let error = endpoint.validate().unwrap_err();
        assert!(matches!(error, Error::RootMissing { ref path } if *path == src_path));
    }

    #[test]
    fn test_endpoint_rejects_same_directory() {
        let base = TempDir::new().unwrap();
        std::fs::create_dir(base.path().join("data")).unwrap();
        let data = base.path().join("data");
        let spelled_differently = base.path().join("data/../data");

        let error = SyncEndpoint::new(&data, &spelled_differently).unwrap_err();
        assert!(matches!(error, Error::OverlappingRoots { .. }));
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_endpoint_rejects_source_inside_destination() {
        let base = TempDir::new().unwrap();
        let inner = base.path().join("b");
        std::fs::create_dir(&inner).unwrap();

        let error = SyncEndpoint::new(&inner, base.path()).unwrap_err();
        assert!(matches!(
            error,
            Error::OverlappingRoots { ref source_root, ref destination_root }
                if *source_root == inner && destination_root == base.path()
        ));
    }

    #[test]
    fn test_endpoint_rejects_destination_inside_source() {
        let base = TempDir::new().unwrap();
        let inner = base.path().join("m");
        std::fs::create_dir(&inner).unwrap();

        assert!(matches!(
            SyncEndpoint::new(base.path(), &inner),
            Err(Error::OverlappingRoots { .. })
        ));
    }

    #[test]
    fn test_endpoint_allows_sibling_with_shared_prefix() {
        let base = TempDir::new().unwrap();
        std::fs::create_dir(base.path().join("data")).unwrap();
        std::fs::create_dir(base.path().join("data-backup")).unwrap();

        assert!(SyncEndpoint::new(base.path().join("data"), base.path().join("data-backup")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_endpoint_revalidation_detects_relinked_root() {
        let base = TempDir::new().unwrap();
        let src = base.path().join("src");
        let dst = base.path().join("dst");
        std::fs::create_dir_all(src.join("inner")).unwrap();
        std::fs::create_dir(&dst).unwrap();
        let endpoint = SyncEndpoint::new(&src, &dst).unwrap();

        std::fs::remove_dir(&dst).unwrap();
        std::os::unix::fs::symlink(src.join("inner"), &dst).unwrap();

        assert!(matches!(
            endpoint.validate(),
            Err(Error::OverlappingRoots { .. })
        ));
    }

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::from_bytes([0xAB; 16]);
        assert_eq!(hash.to_hex(), "AB".repeat(16));
    }

    #[test]
    fn test_pass_stats_display() {
        let mut stats = PassStats::new();
        stats.record(ActionKind::CreateDirectory, true);
        stats.record(ActionKind::CopyFile, false);
        let text = stats.to_string();
        assert!(text.contains("1 dirs created"));
        assert!(text.ends_with("1 failed (1 copy)"));
    }

    #[test]
    fn test_pass_stats_failures_per_kind() {
        let mut stats = PassStats::new();
        stats.record(ActionKind::CopyFile, false);
        stats.record(ActionKind::CopyFile, false);
        stats.record(ActionKind::MoveFile, false);
        stats.record(ActionKind::MoveFile, true);

        let mut other = PassStats::new();
        other.record(ActionKind::CopyFile, false);
        stats.merge(&other);

        assert_eq!(stats.failed, 4);
        assert_eq!(stats.failed_of(ActionKind::CopyFile), 3);
        assert_eq!(stats.failed_of(ActionKind::MoveFile), 1);
        assert_eq!(stats.failed_of(ActionKind::DeleteFile), 0);
        assert_eq!(stats.files_moved, 1);
        assert!(stats.to_string().ends_with("4 failed (1 move, 3 copy)"));
    }
}
