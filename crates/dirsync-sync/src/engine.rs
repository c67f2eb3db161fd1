//! Synchronization engine: one pass from validation to execution

use crate::comparator::{FileComparator, DEFAULT_HASH_BUFFER_SIZE};
use crate::executor::{summarize, ActionExecutor, ExecutorConfig};
use crate::planner::{SyncPlan, SyncPlanner};
use crate::scanner::scan_tree;
use crate::sink::SinkSet;
use dirsync_config::Config;
use dirsync_types::{ActionOutcome, HashAlgorithm, LogSink, PassStats, Result, SyncEndpoint};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Options for a synchronization engine
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Turn delete+copy pairs with identical content into renames
    pub detect_moves: bool,
    /// Digest used by the deep comparison tier
    pub hash_algorithm: HashAlgorithm,
    /// Read buffer used when hashing
    pub hash_buffer_size: usize,
    /// How actions are executed
    pub executor: ExecutorConfig,
}

impl SyncOptions {
    /// Create options from main config
    pub fn from_config(config: &Config) -> Self {
        Self {
            detect_moves: config.sync.detect_moves,
            hash_algorithm: config.sync.hash_algorithm,
            hash_buffer_size: config.execution.hash_buffer_size,
            executor: ExecutorConfig::from_config(config),
        }
    }

    /// Plan and log, but change nothing
    pub fn dry_run(mut self) -> Self {
        self.executor.dry_run = true;
        self
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            detect_moves: true,
            hash_algorithm: HashAlgorithm::default(),
            hash_buffer_size: DEFAULT_HASH_BUFFER_SIZE,
            executor: ExecutorConfig::default(),
        }
    }
}

/// Result of one synchronization pass
#[derive(Debug, Clone)]
pub struct PassReport {
    /// Number of planned actions
    pub planned: usize,
    /// Outcome of each executed action
    pub outcomes: Vec<ActionOutcome>,
    /// Aggregated statistics
    pub stats: PassStats,
}

impl PassReport {
    /// Failed outcomes only
    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success)
    }
}

/// One-way synchronization engine for a source/destination pair
///
/// The engine keeps no state between passes; every pass rescans both trees.
pub struct SyncEngine {
    endpoint: SyncEndpoint,
    planner: SyncPlanner,
    executor: ActionExecutor,
    sink: Arc<dyn LogSink>,
}

impl SyncEngine {
    /// Create an engine that reports to `sink`
    pub fn new(endpoint: SyncEndpoint, options: SyncOptions, sink: Arc<dyn LogSink>) -> Self {
        let comparator = FileComparator::new(options.hash_algorithm, options.hash_buffer_size);
        Self {
            endpoint,
            planner: SyncPlanner::new(comparator, options.detect_moves),
            executor: ActionExecutor::new(options.executor),
            sink,
        }
    }

    /// Create an engine with default options and no log sinks
    pub fn with_defaults(endpoint: SyncEndpoint) -> Self {
        Self::new(endpoint, SyncOptions::default(), Arc::new(SinkSet::new()))
    }

    /// Endpoint this engine synchronizes
    pub fn endpoint(&self) -> &SyncEndpoint {
        &self.endpoint
    }

    /// Sink that receives operator-facing messages
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Validate roots, scan both trees and plan
    pub async fn plan(&self) -> Result<SyncPlan> {
        self.endpoint.validate()?;

        let source = scan_tree(self.endpoint.source()).await?;
        let destination = scan_tree(self.endpoint.destination()).await?;
        debug!(
            "Source has {} entries, destination has {}",
            source.len(),
            destination.len()
        );

        self.planner
            .plan(&self.endpoint, &source, &destination)
            .await
    }

    /// Run one full pass
    ///
    /// Setup and planning errors are returned. Action failures are not: they
    /// are logged and counted in the report.
    pub async fn run_pass(&self) -> Result<PassReport> {
        let start = Instant::now();
        info!(
            "Synchronizing '{}' -> '{}'",
            self.endpoint.source().display(),
            self.endpoint.destination().display()
        );

        let plan = self.plan().await?;
        let outcomes = self.executor.execute(&plan, self.sink.as_ref()).await;

        let mut stats = summarize(&outcomes);
        stats.duration = start.elapsed();

        info!("Pass finished in {:?}: {}", stats.duration, stats);
        Ok(PassReport {
            planned: plan.len(),
            outcomes,
            stats,
        })
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("endpoint", &self.endpoint)
            .field("planner", &self.planner)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
