//! Concurrent action execution

use crate::action::{ExecutionPhase, SyncAction};
use crate::planner::SyncPlan;
use dirsync_config::Config;
use dirsync_types::{ActionOutcome, LogSink, PassStats};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Configuration for the action executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Run directory creation, file actions and directory deletion one phase at a time
    pub phased: bool,
    /// Maximum in-flight actions per phase (0 = unbounded)
    pub max_concurrent: usize,
    /// Log actions without performing them
    pub dry_run: bool,
}

impl ExecutorConfig {
    /// Create executor config from main config
    pub fn from_config(config: &Config) -> Self {
        Self {
            phased: config.execution.phased,
            max_concurrent: config.execution.max_concurrent_actions,
            dry_run: config.sync.dry_run,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            phased: true,
            max_concurrent: 0,
            dry_run: false,
        }
    }
}

/// Runs a plan's actions concurrently and collects their outcomes
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    config: ExecutorConfig,
    semaphore: Option<Arc<Semaphore>>,
}

impl ActionExecutor {
    /// Create a new executor
    pub fn new(config: ExecutorConfig) -> Self {
        let semaphore = (config.max_concurrent > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent)));
        Self { config, semaphore }
    }

    /// Executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute every action in the plan
    ///
    /// A failing action never stops the others. Outcomes are returned in
    /// execution order.
    pub async fn execute(&self, plan: &SyncPlan, sink: &dyn LogSink) -> Vec<ActionOutcome> {
        if plan.is_empty() {
            return Vec::new();
        }

        if !self.config.phased {
            debug!("Executing {} actions in a single batch", plan.len());
            return self.run_batch(plan.actions().iter(), sink).await;
        }

        let mut outcomes = Vec::with_capacity(plan.len());
        for phase in ExecutionPhase::ALL {
            let actions: Vec<&SyncAction> = plan.phase(phase).collect();
            if actions.is_empty() {
                continue;
            }
            debug!("Phase '{}': {} actions", phase, actions.len());
            outcomes.extend(self.run_batch(actions.into_iter(), sink).await);
        }
        outcomes
    }

    async fn run_batch<'a, I>(&self, actions: I, sink: &dyn LogSink) -> Vec<ActionOutcome>
    where
        I: Iterator<Item = &'a SyncAction>,
    {
        let dry_run = self.config.dry_run;
        let futures = actions.map(|action| {
            let semaphore = self.semaphore.clone();
            async move {
                // The semaphore is never closed, so a failed acquire only
                // means running unthrottled
                let _permit = match &semaphore {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };
                action.execute(sink, dry_run).await
            }
        });
        join_all(futures).await
    }
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

/// Fold action outcomes into pass statistics
pub fn summarize(outcomes: &[ActionOutcome]) -> PassStats {
    let mut stats = PassStats::new();
    for outcome in outcomes {
        stats.record(outcome.kind, outcome.success);
    }
    info!("Executed {} actions: {}", outcomes.len(), stats);
    stats
}
