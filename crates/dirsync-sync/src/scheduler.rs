//! Periodic pass scheduling

use crate::engine::SyncEngine;
use dirsync_types::{ErrorSeverity, PassStats, SyncInterval};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// What a scheduler run did before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    /// Passes started
    pub passes: u64,
    /// Passes that ended in an error
    pub failed_passes: u64,
    /// Statistics of all successful passes combined
    pub totals: PassStats,
    /// Error that stopped the schedule because no later pass could succeed
    pub fatal_error: Option<String>,
}

/// Runs synchronization passes one after another with a fixed pause
#[derive(Debug)]
pub struct SyncScheduler {
    engine: SyncEngine,
    interval: Duration,
    max_passes: Option<u64>,
}

impl SyncScheduler {
    /// Create a scheduler pausing `interval` between passes
    pub fn new(engine: SyncEngine, interval: SyncInterval) -> Self {
        Self {
            engine,
            interval: interval.as_duration(),
            max_passes: None,
        }
    }

    /// Override the pause with an arbitrary duration
    pub fn with_period(mut self, period: Duration) -> Self {
        self.interval = period;
        self
    }

    /// Stop after this many passes
    pub fn with_max_passes(mut self, max_passes: u64) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Engine driven by this scheduler
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Run passes until `shutdown` resolves or the pass limit is reached
    ///
    /// Passes never overlap. A failed pass is logged and the next one runs on
    /// schedule, unless its error is not recoverable, which ends the run.
    /// Shutdown is honored between passes.
    pub async fn run<F>(&self, shutdown: F) -> ScheduleSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let sink = self.engine.sink();
        let period = describe_period(self.interval);
        let mut summary = ScheduleSummary::default();

        loop {
            sink.log(
                &format!("Starting synchronization (Interval: {})", period),
                true,
            )
            .await;

            summary.passes += 1;
            let last = self.max_passes.is_some_and(|max| summary.passes >= max);

            match self.engine.run_pass().await {
                Ok(report) => {
                    summary.totals.merge(&report.stats);
                    let message = if last {
                        format!("Synchronization completed: {}", report.stats)
                    } else {
                        format!(
                            "Synchronization completed: {}. Next run in {}",
                            report.stats, period
                        )
                    };
                    sink.log(&message, true).await;
                }
                Err(e) => {
                    summary.failed_passes += 1;
                    if e.severity() >= ErrorSeverity::High {
                        error!("Pass {} failed: {}", summary.passes, e);
                    } else {
                        warn!("Pass {} failed: {}", summary.passes, e);
                    }
                    sink.log(&format!("Synchronization failed: {}", e), true)
                        .await;

                    if !e.is_recoverable() {
                        sink.log("Synchronization stopped: retrying cannot fix this", true)
                            .await;
                        summary.fatal_error = Some(e.to_string());
                        break;
                    }
                }
            }

            if last {
                break;
            }

            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested after {} passes", summary.passes);
                    break;
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        summary
    }
}

fn describe_period(period: Duration) -> String {
    let secs = period.as_secs();
    if secs > 0 && secs % 60 == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    } else {
        format!("{:?}", period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SyncOptions;
    use crate::sink::MemorySink;
    use dirsync_types::SyncEndpoint;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn scheduler(src: &TempDir, dst: &TempDir) -> (SyncScheduler, MemorySink) {
        let sink = MemorySink::new();
        let endpoint = SyncEndpoint::new(src.path(), dst.path()).unwrap();
        let engine = SyncEngine::new(endpoint, SyncOptions::default(), Arc::new(sink.clone()));
        let scheduler = SyncScheduler::new(engine, SyncInterval::default())
            .with_period(Duration::from_millis(10));
        (scheduler, sink)
    }

    #[tokio::test]
    async fn test_runs_requested_number_of_passes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("f.txt"), b"data").unwrap();
        let (scheduler, sink) = scheduler(&src, &dst);

        let summary = scheduler
            .with_max_passes(3)
            .run(std::future::pending())
            .await;

        assert_eq!(summary.passes, 3);
        assert_eq!(summary.failed_passes, 0);
        // Only the first pass has anything to copy
        assert_eq!(summary.totals.files_copied, 1);
        let starts = sink
            .messages()
            .iter()
            .filter(|message| message.starts_with("Starting synchronization"))
            .count();
        assert_eq!(starts, 3);
    }

    #[tokio::test]
    async fn test_shutdown_stops_between_passes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let (scheduler, _sink) = scheduler(&src, &dst);

        let summary = scheduler.run(std::future::ready(())).await;
        assert_eq!(summary.passes, 1);
    }

    #[tokio::test]
    async fn test_failed_pass_is_logged_and_retried() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let (scheduler, sink) = scheduler(&src, &dst);
        drop(dst);

        let summary = scheduler
            .with_max_passes(2)
            .run(std::future::pending())
            .await;

        assert_eq!(summary.passes, 2);
        assert_eq!(summary.failed_passes, 2);
        assert!(sink.contains("Synchronization failed: Directory"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unrecoverable_error_stops_schedule() {
        let base = TempDir::new().unwrap();
        let src = base.path().join("src");
        let dst = base.path().join("dst");
        std::fs::create_dir_all(src.join("inner")).unwrap();
        std::fs::create_dir(&dst).unwrap();
        let sink = MemorySink::new();
        let endpoint = SyncEndpoint::new(&src, &dst).unwrap();
        let engine = SyncEngine::new(endpoint, SyncOptions::default(), Arc::new(sink.clone()));

        // Destination now resolves to a directory inside the source
        std::fs::remove_dir(&dst).unwrap();
        std::os::unix::fs::symlink(src.join("inner"), &dst).unwrap();

        let summary = SyncScheduler::new(engine, SyncInterval::default())
            .with_period(Duration::from_millis(10))
            .with_max_passes(5)
            .run(std::future::pending())
            .await;

        assert_eq!(summary.passes, 1);
        assert_eq!(summary.failed_passes, 1);
        assert!(summary.fatal_error.unwrap().contains("overlap"));
        assert!(sink.contains("Synchronization stopped"));
    }

    #[test]
    fn test_describe_period() {
        assert_eq!(describe_period(Duration::from_secs(30 * 60)), "30 minutes");
        assert_eq!(describe_period(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_period(Duration::from_millis(10)), "10ms");
    }
}
