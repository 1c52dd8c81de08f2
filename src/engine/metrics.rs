// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::time::Duration;

/// Read-only snapshot returned by [`UnifiedEngine::metrics`](crate::engine::UnifiedEngine::metrics).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineMetrics {
    pub total_processed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub avg_processing_time: Duration,
    pub error_rate: f64,
    pub active_count: usize,
    pub queue_size: usize,
    pub cache_size: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub cancelled_count: usize,
}

/// Point-in-time gauges the recorder cannot know on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gauges {
    pub active_count: usize,
    pub queue_size: usize,
    pub cache_size: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub cancelled_count: usize,
}

/// Running counters owned by the coordinator.
///
/// `avg_processing_time` averages successful executions only; `error_rate` is
/// failures over everything that reached Completed or Failed.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    total_processed: u64,
    successes: u64,
    failures: u64,
    cache_hits: u64,
    cache_misses: u64,
    total_elapsed: Duration,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, elapsed: Duration) {
        self.total_processed += 1;
        self.successes += 1;
        self.total_elapsed += elapsed;
    }

    pub fn record_failure(&mut self) {
        self.total_processed += 1;
        self.failures += 1;
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn avg_processing_time(&self) -> Duration {
        if self.successes == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.total_elapsed.as_secs_f64() / self.successes as f64)
    }

    pub fn error_rate(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        self.failures as f64 / self.total_processed as f64
    }

    pub fn snapshot(&self, gauges: Gauges) -> EngineMetrics {
        EngineMetrics {
            total_processed: self.total_processed,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            avg_processing_time: self.avg_processing_time(),
            error_rate: self.error_rate(),
            active_count: gauges.active_count,
            queue_size: gauges.queue_size,
            cache_size: gauges.cache_size,
            completed_count: gauges.completed_count,
            failed_count: gauges.failed_count,
            cancelled_count: gauges.cancelled_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_over_successes() {
        let mut recorder = MetricsRecorder::new();
        for secs in [1.0, 2.0, 3.0] {
            recorder.record_success(Duration::from_secs_f64(secs));
        }
        assert_eq!(recorder.avg_processing_time(), Duration::from_secs(2));
        assert_eq!(recorder.avg_processing_time().as_secs_f64(), 2.0);
    }

    #[test]
    fn test_error_rate() {
        let mut recorder = MetricsRecorder::new();
        for _ in 0..3 {
            recorder.record_success(Duration::from_millis(5));
        }
        recorder.record_failure();

        assert_eq!(recorder.error_rate(), 0.25);
        let snapshot = recorder.snapshot(Gauges::default());
        assert_eq!(snapshot.total_processed, 4);
        assert_eq!(snapshot.error_rate, 0.25);
    }

    #[test]
    fn test_empty_recorder() {
        let recorder = MetricsRecorder::new();
        assert_eq!(recorder.avg_processing_time(), Duration::ZERO);
        assert_eq!(recorder.error_rate(), 0.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut recorder = MetricsRecorder::new();
        recorder.record_cache_hit();
        recorder.record_cache_miss();
        recorder.record_cache_miss();

        let snapshot = recorder.snapshot(Gauges {
            queue_size: 2,
            ..Gauges::default()
        });
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["cache_hits"], 1);
        assert_eq!(json["cache_misses"], 2);
        assert_eq!(json["queue_size"], 2);
    }
}
