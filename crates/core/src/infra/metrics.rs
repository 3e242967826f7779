use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::error::ErrorCode;

/// ローカルメトリクス収集器
pub struct Metrics {
    counters: Mutex<MetricsCounters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default)]
struct MetricsCounters {
    paraphrases_requested: u64,
    paraphrases_succeeded: u64,
    fallbacks: u64,
    copies: u64,
    errors_validation: u64,
    errors_config: u64,
    errors_rejected: u64,
    errors_throttled: u64,
    errors_unavailable: u64,
    errors_storage: u64,
    errors_other: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub phase: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// メトリクスサマリー（表示用）
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub paraphrases_requested: u64,
    pub paraphrases_succeeded: u64,
    pub fallbacks: u64,
    pub copies: u64,
    pub error_counts: ErrorCounts,
    pub avg_latency_ms: AvgLatency,
    pub recent_latencies: Vec<LatencyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorCounts {
    pub validation: u64,
    pub config: u64,
    pub rejected: u64,
    pub throttled: u64,
    pub unavailable: u64,
    pub storage: u64,
    pub other: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgLatency {
    pub paraphrase: Option<f64>,
    pub persist: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(MetricsCounters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    pub fn inc_paraphrases_requested(&self) {
        self.counters.lock().paraphrases_requested += 1;
    }

    pub fn inc_paraphrases_succeeded(&self) {
        self.counters.lock().paraphrases_succeeded += 1;
    }

    /// フォールバックで飛ばしたモデル数を加算
    pub fn inc_fallbacks(&self, skipped: u64) {
        self.counters.lock().fallbacks += skipped;
    }

    pub fn inc_copies(&self) {
        self.counters.lock().copies += 1;
    }

    pub fn inc_error(&self, code: ErrorCode) {
        let mut c = self.counters.lock();
        match code {
            ErrorCode::Validation => c.errors_validation += 1,
            ErrorCode::Configuration => c.errors_config += 1,
            ErrorCode::Rejected => c.errors_rejected += 1,
            ErrorCode::Throttled => c.errors_throttled += 1,
            ErrorCode::Unavailable => c.errors_unavailable += 1,
            ErrorCode::Storage => c.errors_storage += 1,
            ErrorCode::InvalidState | ErrorCode::Clipboard | ErrorCode::Internal => {
                c.errors_other += 1
            }
        }
    }

    pub fn record_latency(&self, phase: &str, duration_ms: u64) {
        let record = LatencyRecord {
            phase: phase.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut latencies = self.latencies.lock();
        latencies.push(record);
        // 最新1000件のみ保持
        if latencies.len() > 1000 {
            let excess = latencies.len() - 1000;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = self.counters.lock();
        let latencies = self.latencies.lock();

        let avg = |phase: &str| -> Option<f64> {
            let vals: Vec<f64> = latencies
                .iter()
                .filter(|r| r.phase == phase)
                .map(|r| r.duration_ms as f64)
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        };

        let recent: Vec<LatencyRecord> = latencies.iter().rev().take(20).cloned().collect();

        MetricsSummary {
            paraphrases_requested: c.paraphrases_requested,
            paraphrases_succeeded: c.paraphrases_succeeded,
            fallbacks: c.fallbacks,
            copies: c.copies,
            error_counts: ErrorCounts {
                validation: c.errors_validation,
                config: c.errors_config,
                rejected: c.errors_rejected,
                throttled: c.errors_throttled,
                unavailable: c.errors_unavailable,
                storage: c.errors_storage,
                other: c.errors_other,
            },
            avg_latency_ms: AvgLatency {
                paraphrase: avg("paraphrase"),
                persist: avg("persist"),
            },
            recent_latencies: recent,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
