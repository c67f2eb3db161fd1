//! dirsync Testing Suite
//!
//! This crate provides cross-crate integration tests and benchmarks for
//! dirsync, plus the tree-building helpers they share.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// This module provides common utilities used across all test files
/// to ensure consistency and reduce code duplication.
pub mod test_utils;

pub use test_utils::{assert_trees_match, TestTree, TreeContents};
