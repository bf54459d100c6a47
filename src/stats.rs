//! `EngineStats`: atomically-incremented counters, deterministic
//! regardless of thread schedule.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct EngineStats {
    transformations_run: AtomicU64,
    tokens_emitted: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
    validation_errors: AtomicU64,
    total_time_nanos: AtomicU64,
}

impl EngineStats {
    pub fn record_transformation(&self) {
        self.transformations_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_tokens(&self, n: u64) {
        self.tokens_emitted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_bytes(&self, input: u64, output: u64) {
        self.bytes_in.fetch_add(input, Ordering::Relaxed);
        self.bytes_out.fetch_add(output, Ordering::Relaxed);
    }

    pub fn add_validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_validation_error_count(&self, n: u64) {
        self.validation_errors.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_time(&self, elapsed: Duration) {
        self.total_time_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transformations_run: self.transformations_run.load(Ordering::Relaxed),
            tokens_emitted: self.tokens_emitted.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            total_time: Duration::from_nanos(self.total_time_nanos.load(Ordering::Relaxed)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub transformations_run: u64,
    pub tokens_emitted: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub validation_errors: u64,
    pub total_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_increments_are_exact() {
        let stats = Arc::new(EngineStats::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.add_bytes(1, 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = stats.snapshot();
        assert_eq!(snap.bytes_in, 8000);
        assert_eq!(snap.bytes_out, 8000);
    }
}
