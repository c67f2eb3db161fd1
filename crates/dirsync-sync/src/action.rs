//! Filesystem mutation actions
//!
//! Every action carries the roots it needs, so it can run on its own and
//! describe itself without looking at the plan it came from. Actions only
//! ever write below the destination root: a symlink found where a directory
//! or file is about to be written is replaced, never written through.

use dirsync_types::{ActionKind, ActionOutcome, LogSink, RelativePath};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Execution phase an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecutionPhase {
    /// Directory creation
    CreateDirectories,
    /// Moves, deletions and copies of files
    Files,
    /// Recursive directory deletion
    DeleteDirectories,
}

impl ExecutionPhase {
    /// All phases in execution order
    pub const ALL: [ExecutionPhase; 3] = [
        ExecutionPhase::CreateDirectories,
        ExecutionPhase::Files,
        ExecutionPhase::DeleteDirectories,
    ];
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDirectories => f.write_str("create directories"),
            Self::Files => f.write_str("files"),
            Self::DeleteDirectories => f.write_str("delete directories"),
        }
    }
}

/// One planned change to the destination tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Create `path` below `root` (parents included)
    CreateDirectory {
        /// Destination root
        root: PathBuf,
        /// Directory to create
        path: RelativePath,
    },
    /// Recursively delete `path` below `root`
    DeleteDirectory {
        /// Destination root
        root: PathBuf,
        /// Directory to delete
        path: RelativePath,
    },
    /// Copy `path` from `source_root` to `root`, overwriting
    CopyFile {
        /// Destination root
        root: PathBuf,
        /// File to copy
        path: RelativePath,
        /// Source root
        source_root: PathBuf,
    },
    /// Delete `path` below `root`
    DeleteFile {
        /// Destination root
        root: PathBuf,
        /// File to delete
        path: RelativePath,
    },
    /// Rename `old_path` to `path`, both below `root`
    MoveFile {
        /// Destination root
        root: PathBuf,
        /// New location
        path: RelativePath,
        /// Current location
        old_path: RelativePath,
    },
}

impl SyncAction {
    /// Kind of this action
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::CreateDirectory { .. } => ActionKind::CreateDirectory,
            Self::DeleteDirectory { .. } => ActionKind::DeleteDirectory,
            Self::CopyFile { .. } => ActionKind::CopyFile,
            Self::DeleteFile { .. } => ActionKind::DeleteFile,
            Self::MoveFile { .. } => ActionKind::MoveFile,
        }
    }

    /// Phase this action runs in when execution is phased
    pub fn phase(&self) -> ExecutionPhase {
        match self {
            Self::CreateDirectory { .. } => ExecutionPhase::CreateDirectories,
            Self::DeleteDirectory { .. } => ExecutionPhase::DeleteDirectories,
            Self::CopyFile { .. } | Self::DeleteFile { .. } | Self::MoveFile { .. } => {
                ExecutionPhase::Files
            }
        }
    }

    /// Relative path this action writes to
    pub fn target(&self) -> &RelativePath {
        match self {
            Self::CreateDirectory { path, .. }
            | Self::DeleteDirectory { path, .. }
            | Self::CopyFile { path, .. }
            | Self::DeleteFile { path, .. }
            | Self::MoveFile { path, .. } => path,
        }
    }

    /// Human-readable description
    pub fn describe(&self) -> String {
        match self {
            Self::CreateDirectory { root, path } => {
                format!("create directory {}", path.resolve(root).display())
            }
            Self::DeleteDirectory { root, path } => {
                format!("remove directory {}", path.resolve(root).display())
            }
            Self::CopyFile {
                root,
                path,
                source_root,
            } => format!(
                "copy {} to {}",
                path.resolve(source_root).display(),
                path.resolve(root).display()
            ),
            Self::DeleteFile { root, path } => {
                format!("delete file {}", path.resolve(root).display())
            }
            Self::MoveFile {
                root,
                path,
                old_path,
            } => format!(
                "move {} to {}",
                old_path.resolve(root).display(),
                path.resolve(root).display()
            ),
        }
    }

    /// Run the action, reporting the outcome to `sink`
    ///
    /// Failures are logged and returned as an unsuccessful outcome, never as
    /// an error. In dry-run mode nothing is touched and the action counts as
    /// successful.
    pub async fn execute(&self, sink: &dyn LogSink, dry_run: bool) -> ActionOutcome {
        let kind = self.kind();

        if dry_run {
            let message = format!("Would {}", self.describe());
            sink.log(&message, true).await;
            return ActionOutcome::succeeded(kind, message);
        }

        let (success, message) = match self {
            Self::CreateDirectory { root, path } => create_directory(root, path).await,
            Self::DeleteDirectory { root, path } => delete_directory(&path.resolve(root)).await,
            Self::CopyFile {
                root,
                path,
                source_root,
            } => copy_file(&path.resolve(source_root), &path.resolve(root)).await,
            Self::DeleteFile { root, path } => delete_file(&path.resolve(root)).await,
            Self::MoveFile {
                root,
                path,
                old_path,
            } => move_file(&old_path.resolve(root), &path.resolve(root)).await,
        };

        if let Some(message) = &message {
            sink.log(message, true).await;
        }
        let message = message.unwrap_or_else(|| self.describe());

        if success {
            debug!("{}: {}", kind, message);
            ActionOutcome::succeeded(kind, message)
        } else {
            warn!("{} failed: {}", kind, message);
            ActionOutcome::failed(kind, message)
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

// Each helper returns (success, operator message). `None` means nothing worth
// telling the operator happened.

/// Remove `path` if it is a symlink, leaving whatever it points to alone
async fn unlink_symlink(path: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.file_type().is_symlink() => {}
        _ => return Ok(()),
    }

    debug!("Replacing symlink: {}", path.display());
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => match fs::symlink_metadata(path).await {
            // A concurrent action already put a real directory here
            Ok(metadata) if metadata.is_dir() => Ok(()),
            // Directory links on Windows
            Ok(metadata) if metadata.file_type().is_symlink() => {
                fs::remove_dir(path).await.map_err(|_| e)
            }
            _ => Err(e),
        },
    }
}

async fn create_directory(root: &Path, relative: &RelativePath) -> (bool, Option<String>) {
    let full = relative.resolve(root);
    let path = full.as_path();

    let mut current = root.to_path_buf();
    for component in relative.as_path().components() {
        current.push(component);
        if let Err(e) = unlink_symlink(&current).await {
            return (
                false,
                Some(format!(
                    "Couldn't create directory: {}: {}",
                    path.display(),
                    e
                )),
            );
        }
    }

    match fs::create_dir_all(path).await {
        Ok(()) => (
            true,
            Some(format!("Created missing directory: {}", path.display())),
        ),
        Err(e) => (
            false,
            Some(format!(
                "Couldn't create directory: {}: {}",
                path.display(),
                e
            )),
        ),
    }
}

async fn delete_directory(path: &Path) -> (bool, Option<String>) {
    if fs::symlink_metadata(path).await.is_err() {
        return (true, None);
    }

    match fs::remove_dir_all(path).await {
        Ok(()) => (
            true,
            Some(format!(
                "Removed directory and its contents: {}",
                path.display()
            )),
        ),
        // Already removed together with a parent
        Err(e) if e.kind() == ErrorKind::NotFound => (true, None),
        Err(e) => (
            false,
            Some(format!(
                "Couldn't remove directory: {}: {}",
                path.display(),
                e
            )),
        ),
    }
}

async fn copy_file(source: &Path, destination: &Path) -> (bool, Option<String>) {
    let metadata = match fs::metadata(source).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => {
            return (
                false,
                Some(format!("File does not exist: {}", source.display())),
            )
        }
    };

    let copied = match unlink_symlink(destination).await {
        Ok(()) => fs::copy(source, destination).await,
        Err(e) => Err(e),
    };
    if let Err(e) = copied {
        return (
            false,
            Some(format!(
                "Couldn't copy file: {} to {}: {}",
                source.display(),
                destination.display(),
                e
            )),
        );
    }

    // Next pass sees the pair as shallow-equal only if the mtime matches
    if let Ok(modified) = metadata.modified() {
        if let Err(e) =
            filetime::set_file_mtime(destination, filetime::FileTime::from_system_time(modified))
        {
            warn!(
                "Failed to set modification time for '{}': {}",
                destination.display(),
                e
            );
        }
    }

    (
        true,
        Some(format!("Copied file: {}", destination.display())),
    )
}

async fn delete_file(path: &Path) -> (bool, Option<String>) {
    // A dangling link still counts as present
    if fs::symlink_metadata(path).await.is_err() {
        return (
            false,
            Some(format!("File does not exist: {}", path.display())),
        );
    }

    match fs::remove_file(path).await {
        Ok(()) => (true, Some(format!("Deleted file: {}", path.display()))),
        Err(e) => (
            false,
            Some(format!("Couldn't delete file: {}: {}", path.display(), e)),
        ),
    }
}

async fn move_file(from: &Path, to: &Path) -> (bool, Option<String>) {
    if fs::symlink_metadata(from).await.is_err() {
        return (
            false,
            Some(format!("File does not exist: {}", from.display())),
        );
    }

    match fs::rename(from, to).await {
        Ok(()) => (
            true,
            Some(format!(
                "Moved file: {} to {}",
                from.display(),
                to.display()
            )),
        ),
        Err(e) => (
            false,
            Some(format!(
                "Couldn't move file: {} to {}: {}",
                from.display(),
                to.display(),
                e
            )),
        ),
    }
}
