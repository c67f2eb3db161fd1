//! Core traits for dirsync operations
//!
//! This module defines the logging collaborator consumed by every component
//! of the synchronization engine.

use async_trait::async_trait;
use std::sync::Arc;

/// Destination for operator-facing log lines
///
/// A sink must never fail the caller: its own I/O problems are reported to a
/// fallback channel inside the implementation.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Write one message, optionally prefixed with a timestamp
    async fn log(&self, message: &str, timestamp: bool);
}

#[async_trait]
impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    async fn log(&self, message: &str, timestamp: bool) {
        (**self).log(message, timestamp).await;
    }
}

#[async_trait]
impl<T: LogSink + ?Sized> LogSink for Box<T> {
    async fn log(&self, message: &str, timestamp: bool) {
        (**self).log(message, timestamp).await;
    }
}
