//! Recursive tree enumeration

use dirsync_types::{Error, RelativePath, Result};
use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tokio::fs;
use tracing::debug;

/// Directories and files found under one root, keyed by relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    /// Every directory below the root (the root itself excluded)
    pub directories: BTreeSet<RelativePath>,
    /// Every regular file below the root
    pub files: BTreeSet<RelativePath>,
    /// Symbolic links, recorded but never followed
    pub links: BTreeSet<RelativePath>,
}

impl TreeListing {
    /// Total number of entries
    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len() + self.links.len()
    }

    /// Whether the tree holds nothing
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty() && self.links.is_empty()
    }
}

/// Enumerate all directories and files under `root`
///
/// Entries are classified by their own file type. Symbolic links are listed
/// in [`TreeListing::links`] and never descended into, so every file and
/// directory in the listing lives inside `root` under exactly one path.
/// Anything else that is neither a directory nor a regular file is skipped.
pub async fn scan_tree<P: AsRef<Path>>(root: P) -> Result<TreeListing> {
    let root = root.as_ref();

    match fs::metadata(root).await {
        Ok(metadata) if metadata.is_dir() => {}
        _ => return Err(Error::root_missing(root)),
    }

    let mut listing = TreeListing::default();
    scan_recursive(root, root, &mut listing).await?;

    debug!(
        "Scanned '{}': {} directories, {} files, {} links",
        root.display(),
        listing.directories.len(),
        listing.files.len(),
        listing.links.len()
    );
    Ok(listing)
}

fn scan_recursive<'a>(
    root: &'a Path,
    current: &'a Path,
    listing: &'a mut TreeListing,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = fs::read_dir(current).await.map_err(|e| Error::Io {
            message: format!("Failed to read directory '{}': {}", current.display(), e),
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::Io {
            message: format!(
                "Failed to read directory entry in '{}': {}",
                current.display(),
                e
            ),
        })? {
            let entry_path = entry.path();

            // Does not traverse symlinks
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    debug!("Skipping '{}': {}", entry_path.display(), e);
                    continue;
                }
            };

            let relative = RelativePath::from_root(root, &entry_path)?;

            if file_type.is_symlink() {
                debug!("Not following symlink: {}", entry_path.display());
                listing.links.insert(relative);
            } else if file_type.is_dir() {
                if listing.directories.insert(relative) {
                    scan_recursive(root, &entry_path, listing).await?;
                }
            } else if file_type.is_file() {
                listing.files.insert(relative);
            } else {
                debug!("Skipping special file: {}", entry_path.display());
            }
        }

        Ok(())
    })
}
