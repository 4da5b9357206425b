//! Tracing setup and process-wide counters.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops so tests can share a process.
pub fn init_tracing(default_directive: &str) {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}

#[derive(Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    clarifications_total: AtomicU64,
    plans_total: AtomicU64,
    plan_failures_total: AtomicU64,
    weather_fallback_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub clarifications_total: u64,
    pub plans_total: u64,
    pub plan_failures_total: u64,
    pub weather_fallback_total: u64,
    pub avg_latency_millis: u64,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_clarification(&self) {
        self.clarifications_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_plan(&self) {
        self.plans_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_plan_failure(&self) {
        self.plan_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_weather_fallback(&self) {
        self.weather_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, millis: u64) {
        self.total_latency_millis.fetch_add(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests_total: requests,
            clarifications_total: self.clarifications_total.load(Ordering::Relaxed),
            plans_total: self.plans_total.load(Ordering::Relaxed),
            plan_failures_total: self.plan_failures_total.load(Ordering::Relaxed),
            weather_fallback_total: self.weather_fallback_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests > 0 { latency / requests } else { 0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters_and_averages_latency() {
        let metrics = AppMetrics::new();
        metrics.inc_request();
        metrics.inc_request();
        metrics.inc_clarification();
        metrics.inc_plan();
        metrics.record_latency(30);
        metrics.record_latency(10);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.clarifications_total, 1);
        assert_eq!(snapshot.plans_total, 1);
        assert_eq!(snapshot.plan_failures_total, 0);
        assert_eq!(snapshot.avg_latency_millis, 20);
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing("info");
        init_tracing("debug");
    }
}
