//! One-way directory synchronization engine for dirsync
//!
//! This crate makes a destination tree mirror a source tree:
//!
//! - **Tree Scanning**: recursive enumeration of directories and files as relative paths
//! - **Two-Tier Comparison**: size and modification time first, content digest second
//! - **Planning**: directory creation and deletion, copies, updates, deletions and
//!   rename detection so moved files are not copied again
//! - **Phased Execution**: actions fan out concurrently inside each phase
//! - **Scheduling**: passes repeat on a fixed interval until shutdown
//!
//! # Examples
//!
//! ```rust
//! use dirsync_sync::{ConsoleSink, SyncEngine, SyncOptions};
//! use dirsync_types::SyncEndpoint;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = SyncEndpoint::new("source_dir", "dest_dir")?;
//! let engine = SyncEngine::new(endpoint, SyncOptions::default(), Arc::new(ConsoleSink::new()));
//! let report = engine.run_pass().await?;
//! println!("{}", report.stats);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod comparator;
pub mod engine;
pub mod executor;
pub mod planner;
pub mod scanner;
pub mod scheduler;
pub mod sink;

pub use action::{ExecutionPhase, SyncAction};
pub use comparator::FileComparator;
pub use engine::{PassReport, SyncEngine, SyncOptions};
pub use executor::{ActionExecutor, ExecutorConfig};
pub use planner::{SyncPlan, SyncPlanner};
pub use scanner::{scan_tree, TreeListing};
pub use scheduler::{ScheduleSummary, SyncScheduler};
pub use sink::{ConsoleSink, FileSink, MemorySink, SinkSet};
