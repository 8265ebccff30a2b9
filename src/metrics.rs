//! Session statistics for submitted applications.

use crate::types::decision::Decision;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Counts and latencies across one run of the form.
pub struct SessionMetrics {
    /// Total predictions made
    pub predictions: AtomicU64,
    /// Predictions that came out approved
    pub approvals: AtomicU64,
    /// Prediction latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time of the session
    start_time: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            approvals: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(64)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one decision and how long it took
    pub fn record_decision(&self, decision: &Decision, latency: Duration) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if decision.approved() {
            self.approvals.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
        }

        let bucket = (decision.probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    pub fn rejections(&self) -> u64 {
        self.predictions.load(Ordering::Relaxed) - self.approvals.load(Ordering::Relaxed)
    }

    pub fn approval_rate(&self) -> f64 {
        let total = self.predictions.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.approvals.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(latencies) if !latencies.is_empty() => latencies.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Get probability distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let total = self.predictions.load(Ordering::Relaxed);
        let approvals = self.approvals.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();
        let distribution = self.get_score_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              CREDIT CARD APPROVAL - SESSION SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Applications Scored: {:>6}  │  Session Length: {:>8.1}s    ║",
            total,
            self.start_time.elapsed().as_secs_f64()
        );
        info!(
            "║ Approved: {:>6}  Rejected: {:>6}  │  Approval Rate: {:>5.1}% ║",
            approvals,
            self.rejections(),
            self.approval_rate() * 100.0
        );
        info!(
            "║ Prediction Time (μs): mean={:>6} p50={:>6} p95={:>6} max={:>6}",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.max_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Approval Probability Distribution:                           ║");
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prediction latency statistics
#[derive(Debug, Default, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub max_us: u64,
}
