//! Historical measurement tracking
//!
//! Keeps a bounded window of provider metrics and derives per-provider
//! cost and latency trends from it.

mod buffer;
mod trends;

pub use buffer::{HistoryBuffer, HistoryStats, DEFAULT_HISTORY_CAPACITY};
pub use trends::{ProviderTrend, SummaryStats, TrendAnalysis, MIN_TREND_SAMPLES};
