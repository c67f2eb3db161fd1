//! Two-tier file comparison
//!
//! The shallow tier looks at size and modification time only and never fails.
//! The deep tier streams both files through a digest and reports vanished
//! files as [`Error::FileNotFound`], so "could not compare" is never mistaken
//! for "unchanged".

use digest::Digest;
use dirsync_types::{ContentHash, Error, FileSnapshot, HashAlgorithm, Result};
use md5::Md5;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Default read buffer for hashing
pub const DEFAULT_HASH_BUFFER_SIZE: usize = 64 * 1024;

/// File comparator with a configurable digest
#[derive(Debug, Clone, Copy)]
pub struct FileComparator {
    algorithm: HashAlgorithm,
    buffer_size: usize,
}

enum StreamHasher {
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Md5(hasher) => hasher.update(chunk),
            Self::Blake3(hasher) => {
                hasher.update(chunk);
            }
        }
    }

    fn finish(self) -> ContentHash {
        let mut bytes = [0u8; 16];
        match self {
            Self::Md5(hasher) => bytes.copy_from_slice(&hasher.finalize()),
            // First 128 bits of the 256-bit output
            Self::Blake3(hasher) => bytes.copy_from_slice(&hasher.finalize().as_bytes()[..16]),
        }
        ContentHash::from_bytes(bytes)
    }
}

impl FileComparator {
    /// Create a comparator
    ///
    /// A zero buffer size falls back to [`DEFAULT_HASH_BUFFER_SIZE`].
    pub fn new(algorithm: HashAlgorithm, buffer_size: usize) -> Self {
        let buffer_size = if buffer_size == 0 {
            DEFAULT_HASH_BUFFER_SIZE
        } else {
            buffer_size
        };
        Self {
            algorithm,
            buffer_size,
        }
    }

    /// Digest used by the deep tier
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Size and modification time of a regular file, `None` if it is not one
    pub async fn snapshot<P: AsRef<Path>>(&self, path: P) -> Option<FileSnapshot> {
        let metadata = fs::metadata(path.as_ref()).await.ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().ok()?;
        Some(FileSnapshot {
            size: metadata.len(),
            modified,
        })
    }

    /// Both paths are files with equal size and modification time
    pub async fn shallow_equal<P: AsRef<Path>, Q: AsRef<Path>>(&self, left: P, right: Q) -> bool {
        let (left, right) = (left.as_ref(), right.as_ref());
        match (self.snapshot(left).await, self.snapshot(right).await) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Stream a file through the configured digest
    pub async fn hash_file<P: AsRef<Path>>(&self, path: P) -> Result<ContentHash> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .await
            .map_err(|e| Error::io_at("open", path, e))?;

        let mut hasher = StreamHasher::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| Error::io_at("read", path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        let hash = hasher.finish();
        debug!("{} {}: {}", self.algorithm, path.display(), hash);
        Ok(hash)
    }

    /// Both files have the same content digest
    pub async fn deep_equal<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        left: P,
        right: Q,
    ) -> Result<bool> {
        let left_hash = self.hash_file(left).await?;
        let right_hash = self.hash_file(right).await?;
        Ok(left_hash == right_hash)
    }

    /// Files differ unless both tiers agree
    ///
    /// The deep tier is skipped once the shallow tier already disagrees.
    pub async fn files_differ<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        left: P,
        right: Q,
    ) -> Result<bool> {
        let (left, right) = (left.as_ref(), right.as_ref());
        if !self.shallow_equal(left, right).await {
            return Ok(true);
        }
        Ok(!self.deep_equal(left, right).await?)
    }
}

impl Default for FileComparator {
    fn default() -> Self {
        Self::new(HashAlgorithm::default(), DEFAULT_HASH_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use rstest::rstest;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_with_mtime(dir: &Path, name: &str, content: &[u8], mtime: i64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_md5_known_digest() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_with_mtime(temp_dir.path(), "abc.txt", b"abc", 1_000);

        let hash = FileComparator::default().hash_file(&path).await.unwrap();
        assert_eq!(hash.to_hex(), "900150983CD24FB0D6963F7D28E17F72");
    }

    #[tokio::test]
    async fn test_empty_file_md5() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_with_mtime(temp_dir.path(), "empty", b"", 1_000);

        let hash = FileComparator::default().hash_file(&path).await.unwrap();
        assert_eq!(hash.to_hex(), "D41D8CD98F00B204E9800998ECF8427E");
    }

    #[tokio::test]
    async fn test_blake3_is_truncated_digest() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_with_mtime(temp_dir.path(), "data.bin", b"hello world", 1_000);

        let comparator = FileComparator::new(HashAlgorithm::Blake3, 4096);
        let hash = comparator.hash_file(&path).await.unwrap();
        assert_eq!(&hash.as_bytes()[..], &blake3::hash(b"hello world").as_bytes()[..16]);
    }

    #[tokio::test]
    async fn test_small_buffer_matches_large_buffer() {
        let temp_dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let path = write_with_mtime(temp_dir.path(), "big.bin", &content, 1_000);

        let small = FileComparator::new(HashAlgorithm::Md5, 7).hash_file(&path).await.unwrap();
        let large = FileComparator::default().hash_file(&path).await.unwrap();
        assert_eq!(small, large);
    }

    #[tokio::test]
    async fn test_shallow_equal_requires_size_and_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let a = write_with_mtime(dir, "a", b"12345", 1_000);
        let b = write_with_mtime(dir, "b", b"54321", 1_000);
        let c = write_with_mtime(dir, "c", b"12345", 2_000);
        let d = write_with_mtime(dir, "d", b"123456", 1_000);

        let comparator = FileComparator::default();
        assert!(comparator.shallow_equal(&a, &b).await);
        assert!(!comparator.shallow_equal(&a, &c).await);
        assert!(!comparator.shallow_equal(&a, &d).await);
    }

    #[tokio::test]
    async fn test_shallow_equal_missing_is_false() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_with_mtime(temp_dir.path(), "a", b"x", 1_000);

        let comparator = FileComparator::default();
        assert!(!comparator.shallow_equal(&a, temp_dir.path().join("missing")).await);
        assert!(!comparator.shallow_equal(temp_dir.path().join("missing"), &a).await);
    }

    #[tokio::test]
    async fn test_deep_equal_missing_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_with_mtime(temp_dir.path(), "a", b"x", 1_000);
        let missing = temp_dir.path().join("missing");

        let error = FileComparator::default()
            .deep_equal(&a, &missing)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::FileNotFound { path } if path == missing));
    }

    #[rstest]
    #[case::identical(b"same bytes".as_slice(), 1_000, b"same bytes".as_slice(), 1_000, false)]
    #[case::same_metadata_different_bytes(b"12345".as_slice(), 1_000, b"54321".as_slice(), 1_000, true)]
    #[case::same_bytes_different_mtime(b"12345".as_slice(), 1_000, b"12345".as_slice(), 5_000, true)]
    #[case::different_size(b"1".as_slice(), 1_000, b"12".as_slice(), 1_000, true)]
    #[tokio::test]
    async fn test_files_differ(
        #[case] left: &[u8],
        #[case] left_mtime: i64,
        #[case] right: &[u8],
        #[case] right_mtime: i64,
        #[case] expected: bool,
    ) {
        let temp_dir = TempDir::new().unwrap();
        let a = write_with_mtime(temp_dir.path(), "left", left, left_mtime);
        let b = write_with_mtime(temp_dir.path(), "right", right, right_mtime);

        let differ = FileComparator::default().files_differ(&a, &b).await.unwrap();
        assert_eq!(differ, expected);
    }

    #[tokio::test]
    async fn test_files_differ_skips_hash_when_shallow_fails() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_with_mtime(temp_dir.path(), "a", b"x", 1_000);

        // Missing right side fails shallow first, so no FileNotFound surfaces
        let differ = FileComparator::default()
            .files_differ(&a, temp_dir.path().join("missing"))
            .await
            .unwrap();
        assert!(differ);
    }
}
