//! Bounded measurement history
//!
//! Ring buffer of provider metrics with FIFO eviction once the injected
//! capacity is reached.

use crate::models::{Provider, ProviderMetric};
use serde::Serialize;
use std::collections::VecDeque;

/// Default capacity: 100 samples for each of the three providers
pub const DEFAULT_HISTORY_CAPACITY: usize = 300;

/// Ring buffer holding the most recent measurements
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    buffer: VecDeque<ProviderMetric>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
        }
    }

    /// Append a metric, evicting the oldest entries if at capacity
    pub fn push(&mut self, metric: ProviderMetric) {
        while self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(metric);
    }

    /// Append a whole round in order
    pub fn push_round(&mut self, metrics: impl IntoIterator<Item = ProviderMetric>) {
        for m in metrics {
            self.push(m);
        }
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ProviderMetric> {
        self.buffer.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ProviderMetric> {
        self.buffer.get(index)
    }

    /// Most recent entries, optionally for one provider, returned oldest first
    pub fn recent(&self, provider: Option<Provider>, limit: usize) -> Vec<ProviderMetric> {
        let mut selected: Vec<ProviderMetric> = self
            .buffer
            .iter()
            .rev()
            .filter(|m| provider.map_or(true, |p| m.provider == p))
            .take(limit)
            .cloned()
            .collect();
        selected.reverse();
        selected
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            entries: self.buffer.len(),
            capacity: self.capacity,
            oldest_timestamp: self.buffer.front().map(|m| m.measured_at),
            newest_timestamp: self.buffer.back().map(|m| m.measured_at),
        }
    }
}

/// History buffer statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub entries: usize,
    pub capacity: usize,
    /// Unix seconds of the oldest retained measurement
    pub oldest_timestamp: Option<i64>,
    /// Unix seconds of the newest retained measurement
    pub newest_timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderEndpoint;

    fn sample(provider: Provider, ms: f64) -> ProviderMetric {
        let endpoint =
            ProviderEndpoint::new(provider, "http://localhost/health", "region-1", 0.0002, 99.9);
        ProviderMetric::reachable(&endpoint, ms)
    }

    #[test]
    fn test_push_within_capacity() {
        let mut buffer = HistoryBuffer::new(10);
        for i in 0..5 {
            buffer.push(sample(Provider::Aws, i as f64));
        }
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.capacity(), 10);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_fifo_eviction_after_overflow() {
        let mut buffer = HistoryBuffer::new(DEFAULT_HISTORY_CAPACITY);
        for i in 0..300 {
            buffer.push(sample(Provider::ALL[i % 3], i as f64));
        }
        assert_eq!(buffer.len(), 300);
        let second_before = buffer.get(1).cloned().unwrap();

        buffer.push(sample(Provider::Aws, 300.0));

        assert_eq!(buffer.len(), 300);
        assert_eq!(buffer.get(0), Some(&second_before));
        assert_eq!(buffer.iter().last().unwrap().response_time_ms, Some(300.0));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = HistoryBuffer::new(7);
        for i in 0..100 {
            buffer.push(sample(Provider::Gcp, i as f64));
            assert!(buffer.len() <= 7);
        }
        assert_eq!(buffer.get(0).unwrap().response_time_ms, Some(93.0));
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let mut buffer = HistoryBuffer::new(0);
        buffer.push(sample(Provider::Aws, 1.0));
        buffer.push(sample(Provider::Aws, 2.0));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(0).unwrap().response_time_ms, Some(2.0));
    }

    #[test]
    fn test_recent_filters_and_limits() {
        let mut buffer = HistoryBuffer::new(50);
        for i in 0..9 {
            buffer.push(sample(Provider::ALL[i % 3], i as f64));
        }

        let aws = buffer.recent(Some(Provider::Aws), 2);
        let times: Vec<f64> = aws.iter().filter_map(|m| m.response_time_ms).collect();
        assert_eq!(times, vec![3.0, 6.0]);

        let all = buffer.recent(None, 100);
        assert_eq!(all.len(), 9);
        assert_eq!(all[0].response_time_ms, Some(0.0));
    }

    #[test]
    fn test_stats() {
        let mut buffer = HistoryBuffer::new(4);
        assert_eq!(buffer.stats().oldest_timestamp, None);

        buffer.push_round(vec![sample(Provider::Aws, 1.0), sample(Provider::Azure, 2.0)]);
        let stats = buffer.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.capacity, 4);
        assert!(stats.oldest_timestamp.is_some());

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
