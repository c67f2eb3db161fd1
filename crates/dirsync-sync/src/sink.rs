//! Operator-facing log sinks
//!
//! Sinks never fail their caller. A sink that cannot write reports the problem
//! on stderr and as a `tracing` warning, then carries on.

use async_trait::async_trait;
use chrono::Local;
use dirsync_types::{Error, LogSink, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Writes messages to standard output with an `[HH:MM]` prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Create a console sink
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogSink for ConsoleSink {
    async fn log(&self, message: &str, timestamp: bool) {
        if timestamp {
            println!("[{}] {}", Local::now().format("%H:%M"), message);
        } else {
            println!("{}", message);
        }
    }
}

/// Appends messages to a file with a `[YYYY-MM-DD HH:MM:SS]` prefix
///
/// The file is opened for every message so it can be rotated or removed
/// between writes.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a file sink, creating the file if it does not exist
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::Io {
                message: format!("Failed to create log file '{}': {}", path.display(), e),
            })?;
        Ok(Self { path })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl LogSink for FileSink {
    async fn log(&self, message: &str, timestamp: bool) {
        let line = if timestamp {
            format!("[{}] {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
        } else {
            format!("{}\n", message)
        };

        if let Err(e) = self.append(&line).await {
            eprintln!("Error writing to log file {}: {}", self.path.display(), e);
            warn!("Failed to write log file '{}': {}", self.path.display(), e);
        }
    }
}

/// Keeps every message in memory
///
/// Useful for embedding the engine and for tests that assert on log output.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, in arrival order
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Whether any recorded message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|message| message.contains(needle))
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn log(&self, message: &str, _timestamp: bool) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// Fans every message out to a set of sinks
///
/// With timestamps turned off, messages reach the sinks unprefixed whatever
/// the caller asked for.
#[derive(Clone)]
pub struct SinkSet {
    sinks: Vec<Arc<dyn LogSink>>,
    timestamps: bool,
}

impl Default for SinkSet {
    fn default() -> Self {
        Self {
            sinks: Vec::new(),
            timestamps: true,
        }
    }
}

impl SinkSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or suppress timestamp prefixes
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Add a sink
    pub fn with_sink<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Add a shared sink
    pub fn push(&mut self, sink: Arc<dyn LogSink>) {
        self.sinks.push(sink);
    }

    /// Number of sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether the set has no sinks
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.sinks.len())
            .field("timestamps", &self.timestamps)
            .finish()
    }
}

#[async_trait]
impl LogSink for SinkSet {
    async fn log(&self, message: &str, timestamp: bool) {
        info!(target: "dirsync::sink", "{}", message);
        let timestamp = timestamp && self.timestamps;
        join_all(self.sinks.iter().map(|sink| sink.log(message, timestamp))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_sink_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sync.log");
        let sink = FileSink::new(&path).await.unwrap();
        assert!(path.exists());

        sink.log("first", false).await;
        sink.log("second", true).await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "first");
        assert!(lines[1].starts_with('['));
        assert!(lines[1].ends_with("] second"));
        // [YYYY-MM-DD HH:MM:SS] is 21 characters
        assert_eq!(lines[1].find(']'), Some(20));
    }

    #[tokio::test]
    async fn test_file_sink_creation_fails_for_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no/such/dir/sync.log");
        assert!(FileSink::new(path).await.is_err());
    }

    #[tokio::test]
    async fn test_file_sink_write_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");
        std::fs::create_dir(&log_dir).unwrap();
        let sink = FileSink::new(log_dir.join("sync.log")).await.unwrap();
        std::fs::remove_dir_all(&log_dir).unwrap();

        // Must not panic or propagate
        sink.log("lost", true).await;
        assert!(!log_dir.exists());
    }

    #[tokio::test]
    async fn test_sink_set_fans_out() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let set = SinkSet::new()
            .with_sink(first.clone())
            .with_sink(second.clone());
        assert_eq!(set.len(), 2);

        set.log("hello", true).await;

        assert_eq!(first.messages(), vec!["hello".to_string()]);
        assert_eq!(second.messages(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_sink_set_without_timestamps() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.log");
        let set = SinkSet::new()
            .with_timestamps(false)
            .with_sink(FileSink::new(&path).await.unwrap());

        set.log("Copied file: a.txt", true).await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Copied file: a.txt\n");
    }

    #[test]
    fn test_empty_sink_set_is_fine() {
        let set = SinkSet::new();
        assert!(set.is_empty());
        tokio_test::block_on(set.log("nobody listens", false));
    }
}
