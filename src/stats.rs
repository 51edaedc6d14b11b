use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::{LankyError, Result};

/// Per status-class response counters plus process start time.
#[derive(Debug)]
pub struct RuntimeStats {
    started_at: DateTime<Utc>,
    start_time: Instant,
    // index 0 holds 1xx, 4 holds 5xx
    by_class: [AtomicU64; 5],
}

/// Point-in-time copy of the counters for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: &'static str,
    pub workers: usize,
    pub alive_tasks: usize,
    pub status_1xx: u64,
    pub status_2xx: u64,
    pub status_3xx: u64,
    pub status_4xx: u64,
    pub status_5xx: u64,
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            start_time: Instant::now(),
            by_class: Default::default(),
        }
    }

    /// Counts one response. Codes outside 100..=599 are rejected.
    pub fn record_status(&self, code: u16) -> Result<()> {
        let class = (code / 100) as usize;
        if !(1..=5).contains(&class) {
            return Err(LankyError::UnexpectedStatus(code));
        }
        self.by_class[class - 1].fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn count(&self, class: usize) -> u64 {
        match class {
            1..=5 => self.by_class[class - 1].load(Ordering::Relaxed),
            _ => 0,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Reads the counters and, when inside a tokio runtime, its metrics.
    pub fn snapshot(&self) -> StatsSnapshot {
        let (workers, alive_tasks) = match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let metrics = handle.metrics();
                (metrics.num_workers(), metrics.num_alive_tasks())
            }
            Err(_) => (0, 0),
        };

        StatsSnapshot {
            started_at: self.started_at,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
            workers,
            alive_tasks,
            status_1xx: self.count(1),
            status_2xx: self.count(2),
            status_3xx: self.count(3),
            status_4xx: self.count(4),
            status_5xx: self.count(5),
        }
    }
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_status_class() {
        let stats = RuntimeStats::new();
        for code in [100, 200, 204, 302, 404, 401, 405, 500] {
            stats.record_status(code).unwrap();
        }
        assert_eq!(stats.count(1), 1);
        assert_eq!(stats.count(2), 2);
        assert_eq!(stats.count(3), 1);
        assert_eq!(stats.count(4), 3);
        assert_eq!(stats.count(5), 1);
    }

    #[test]
    fn out_of_range_codes_are_rejected_not_fatal() {
        let stats = RuntimeStats::new();
        assert!(matches!(
            stats.record_status(99),
            Err(LankyError::UnexpectedStatus(99))
        ));
        assert!(stats.record_status(600).is_err());
        assert_eq!((1..=5).map(|c| stats.count(c)).sum::<u64>(), 0);
    }

    #[test]
    fn snapshot_outside_runtime_reports_no_workers() {
        let stats = RuntimeStats::new();
        stats.record_status(200).unwrap();
        let snap = stats.snapshot();
        assert_eq!(snap.workers, 0);
        assert_eq!(snap.status_2xx, 1);
        assert_eq!(snap.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn snapshot_inside_runtime_reports_workers() {
        let snap = RuntimeStats::new().snapshot();
        assert_eq!(snap.workers, 2);
    }
}
