//! Tuning knobs for single-record matching and bulk voting.

use std::ops::RangeInclusive;

use chrono::Duration;

/// Configuration for single-record matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Maximum distance between scheduled times, inclusive (minutes).
    pub time_window_mins: u32,

    /// Shortest route code token considered.
    pub min_token_len: usize,

    /// Longest route code token considered.
    pub max_token_len: usize,
}

impl MatchConfig {
    pub fn new(time_window_mins: u32, min_token_len: usize, max_token_len: usize) -> Self {
        Self {
            time_window_mins,
            min_token_len,
            max_token_len,
        }
    }

    /// Returns the time window as a Duration.
    pub fn time_window(&self) -> Duration {
        Duration::minutes(i64::from(self.time_window_mins))
    }

    /// Accepted route code token lengths.
    pub fn token_len(&self) -> RangeInclusive<usize> {
        self.min_token_len..=self.max_token_len
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            time_window_mins: 3,
            min_token_len: 2,
            max_token_len: 8,
        }
    }
}

/// Thresholds for resolving a bulk vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteConfig {
    /// Votes the winning label needs at least.
    pub min_support: u32,

    /// Share of all votes the winning label needs at least (inclusive).
    pub min_ratio: f64,
}

impl VoteConfig {
    pub fn new(min_support: u32, min_ratio: f64) -> Self {
        Self {
            min_support,
            min_ratio,
        }
    }
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            min_support: 2,
            min_ratio: 0.60,
        }
    }
}
