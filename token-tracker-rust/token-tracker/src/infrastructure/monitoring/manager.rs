use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

const RESPONSE_TIME_WINDOW: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceMetrics {
    pub requests_total: u64,
    pub requests_successful: u64,
    pub requests_failed: u64,
    pub validation_failures: u64,
    pub rpc_errors: u64,
    pub contract_errors: u64,
    pub indexer_errors: u64,
    pub balance_queries: u64,
    pub token_info_queries: u64,
    pub holder_queries: u64,
    pub activity_queries: u64,
    pub response_time_avg_ms: f64,
    pub uptime_seconds: f64,
}

#[derive(Debug)]
pub struct MonitoringManager {
    metrics: Arc<RwLock<ServiceMetrics>>,
    response_times: Arc<RwLock<Vec<f64>>>,
    start_time: DateTime<Utc>,
}

impl Default for MonitoringManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitoringManager {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(ServiceMetrics::default())),
            response_times: Arc::new(RwLock::new(Vec::new())),
            start_time: Utc::now(),
        }
    }

    pub async fn increment_metric(&self, metric_name: &str) {
        let mut metrics = self.metrics.write().await;
        match metric_name {
            "requests_total" => metrics.requests_total += 1,
            "requests_successful" => metrics.requests_successful += 1,
            "requests_failed" => metrics.requests_failed += 1,
            "validation_failures" => metrics.validation_failures += 1,
            "rpc_errors" => metrics.rpc_errors += 1,
            "contract_errors" => metrics.contract_errors += 1,
            "indexer_errors" => metrics.indexer_errors += 1,
            "balance_queries" => metrics.balance_queries += 1,
            "token_info_queries" => metrics.token_info_queries += 1,
            "holder_queries" => metrics.holder_queries += 1,
            "activity_queries" => metrics.activity_queries += 1,
            _ => log::warn!("Unknown metric: {metric_name}"),
        }
    }

    pub async fn record_response_time(&self, response_time_ms: f64) {
        let mut response_times = self.response_times.write().await;
        response_times.push(response_time_ms);

        if response_times.len() > RESPONSE_TIME_WINDOW {
            let excess = response_times.len() - RESPONSE_TIME_WINDOW;
            response_times.drain(0..excess);
        }

        let average = response_times.iter().sum::<f64>() / response_times.len() as f64;
        self.metrics.write().await.response_time_avg_ms = average;
    }

    pub async fn get_metrics(&self) -> ServiceMetrics {
        let mut metrics = self.metrics.read().await.clone();
        metrics.uptime_seconds = (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0;
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_known_and_unknown_metrics() {
        let manager = MonitoringManager::new();
        manager.increment_metric("requests_total").await;
        manager.increment_metric("requests_total").await;
        manager.increment_metric("rpc_errors").await;
        manager.increment_metric("not_a_metric").await;

        let metrics = manager.get_metrics().await;
        assert_eq!(metrics.requests_total, 2);
        assert_eq!(metrics.rpc_errors, 1);
        assert_eq!(metrics.requests_failed, 0);
    }

    #[tokio::test]
    async fn test_response_time_average_uses_window() {
        let manager = MonitoringManager::new();
        manager.record_response_time(10.0).await;
        manager.record_response_time(30.0).await;
        assert_eq!(manager.get_metrics().await.response_time_avg_ms, 20.0);

        for _ in 0..RESPONSE_TIME_WINDOW {
            manager.record_response_time(5.0).await;
        }
        assert_eq!(manager.get_metrics().await.response_time_avg_ms, 5.0);
    }
}
