//! Configuration types for dirsync
//!
//! This module provides type-safe configuration values with validation
//! and serialization support.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Interval between two synchronization passes, in whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
pub struct SyncInterval(u64);

impl SyncInterval {
    /// Minimum interval (1 minute)
    pub const MIN_MINUTES: u64 = 1;
    /// Default interval (30 minutes)
    pub const DEFAULT_MINUTES: u64 = 30;

    /// Create a new interval with validation
    pub fn from_minutes(minutes: u64) -> Result<Self, String> {
        if minutes < Self::MIN_MINUTES {
            Err(format!(
                "Sync interval must be a positive number of minutes, got {}",
                minutes
            ))
        } else {
            Ok(Self(minutes))
        }
    }

    /// Get the interval in minutes
    pub fn minutes(self) -> u64 {
        self.0
    }

    /// Get the interval as a [`Duration`]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0.saturating_mul(60))
    }
}

impl Default for SyncInterval {
    fn default() -> Self {
        Self(Self::DEFAULT_MINUTES)
    }
}

impl TryFrom<u64> for SyncInterval {
    type Error = String;

    fn try_from(minutes: u64) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<SyncInterval> for u64 {
    fn from(interval: SyncInterval) -> Self {
        interval.0
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.0)
    }
}

/// Digest used by the deep comparison tier
///
/// Both algorithms produce a 128-bit [`ContentHash`](crate::ContentHash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HashAlgorithm {
    /// MD5 digest
    #[default]
    Md5,
    /// BLAKE3 digest truncated to 128 bits
    Blake3,
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("Unknown hash algorithm: {}", other)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => f.write_str("md5"),
            Self::Blake3 => f.write_str("blake3"),
        }
    }
}
