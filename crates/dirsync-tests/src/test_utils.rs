//! Unified test utilities for dirsync tests and benchmarks
//!
//! Trees are built inside temporary directories with pinned modification
//! times, so shallow comparisons behave the same on every run.

use filetime::FileTime;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Modification time given to files unless a test asks for another one
pub const DEFAULT_MTIME: i64 = 1_700_000_000;

/// Test data generation patterns
#[derive(Debug, Clone, Copy)]
pub enum TestDataPattern {
    /// All zeros
    Zeros,
    /// Deterministic pseudo-random bytes
    Random,
    /// Realistic file pattern similar to actual files
    Realistic,
}

/// Generate test data with specified pattern
pub fn generate_test_data(size: usize, pattern: TestDataPattern) -> Vec<u8> {
    match pattern {
        TestDataPattern::Zeros => vec![0u8; size],
        TestDataPattern::Random => {
            // xorshift keeps runs reproducible
            let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
            (0..size)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state & 0xFF) as u8
                })
                .collect()
        }
        TestDataPattern::Realistic => (0..size).map(|i| ((i * 7 + 13) % 256) as u8).collect(),
    }
}

/// A directory tree living in a temporary directory
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Root of the tree
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file with [`DEFAULT_MTIME`], creating parent directories
    pub fn file(&self, relative: &str, content: &[u8]) -> PathBuf {
        self.file_with_mtime(relative, content, DEFAULT_MTIME)
    }

    /// Write a file with an explicit modification time (Unix seconds)
    pub fn file_with_mtime(&self, relative: &str, content: &[u8], mtime: i64) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write test file");
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0))
            .expect("Failed to set mtime");
        path
    }

    /// Create a directory (and its parents)
    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.path().join(relative);
        fs::create_dir_all(&path).expect("Failed to create directory");
        path
    }

    /// Remove a file or directory
    pub fn remove(&self, relative: &str) {
        let path = self.path().join(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("Failed to remove directory");
        } else {
            fs::remove_file(&path).expect("Failed to remove file");
        }
    }

    /// Whether a relative path exists
    pub fn exists(&self, relative: &str) -> bool {
        self.path().join(relative).exists()
    }

    /// Read a file's bytes
    pub fn read(&self, relative: &str) -> Vec<u8> {
        fs::read(self.path().join(relative)).expect("Failed to read test file")
    }

    /// Everything below the root
    pub fn contents(&self) -> TreeContents {
        TreeContents::read(self.path())
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Directories and file bytes of a tree, keyed by `/`-joined relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeContents {
    /// Relative directory paths
    pub directories: BTreeSet<String>,
    /// Relative file paths and their bytes
    pub files: BTreeMap<String, Vec<u8>>,
}

impl TreeContents {
    /// Read a tree from disk
    pub fn read(root: &Path) -> Self {
        let mut contents = Self::default();
        contents.collect(root, root);
        contents
    }

    fn collect(&mut self, root: &Path, current: &Path) {
        for entry in fs::read_dir(current).expect("Failed to read directory") {
            let path = entry.expect("Failed to read entry").path();
            let relative = path
                .strip_prefix(root)
                .expect("Entry outside root")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            if path.is_dir() {
                self.directories.insert(relative);
                self.collect(root, &path);
            } else {
                let bytes = fs::read(&path).expect("Failed to read file");
                self.files.insert(relative, bytes);
            }
        }
    }
}

/// Panic unless both trees hold the same directories and file bytes
pub fn assert_trees_match(source: &Path, destination: &Path) {
    let source = TreeContents::read(source);
    let destination = TreeContents::read(destination);
    assert_eq!(
        source.directories, destination.directories,
        "directory sets differ"
    );
    assert_eq!(
        source.files.keys().collect::<Vec<_>>(),
        destination.files.keys().collect::<Vec<_>>(),
        "file sets differ"
    );
    assert_eq!(source.files, destination.files, "file contents differ");
}
