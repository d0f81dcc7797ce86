use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error,
};
use std::task::{Context, Poll};
use std::sync::Arc;
use std::time::Instant;
use futures::future::{ready, Ready};
use futures_util::future::LocalBoxFuture;
use crate::infrastructure::monitoring::manager::MonitoringManager;

#[derive(Clone)]
pub struct MetricsMiddleware {
    monitoring_manager: Arc<MonitoringManager>,
}

impl MetricsMiddleware {
    pub fn new(monitoring_manager: Arc<MonitoringManager>) -> Self {
        Self { monitoring_manager }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsService {
            service: Arc::new(service),
            monitoring_manager: Arc::clone(&self.monitoring_manager),
        }))
    }
}

pub struct MetricsService<S> {
    service: Arc<S>,
    monitoring_manager: Arc<MonitoringManager>,
}

/// Per-route counter for a request path, if the route has one.
fn route_metric(path: &str) -> Option<&'static str> {
    if path.starts_with("/balance") {
        Some("balance_queries")
    } else if path.starts_with("/token-info") {
        Some("token_info_queries")
    } else if path.starts_with("/top-holders") {
        Some("holder_queries")
    } else if path.starts_with("/last-transaction") {
        Some("activity_queries")
    } else {
        None
    }
}

/// Failure counter for an error status.
fn failure_metric(path: &str, status: StatusCode) -> Option<&'static str> {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE => Some("validation_failures"),
        StatusCode::SERVICE_UNAVAILABLE if path.starts_with("/top-holders") => Some("indexer_errors"),
        StatusCode::SERVICE_UNAVAILABLE => Some("rpc_errors"),
        StatusCode::BAD_GATEWAY if path.starts_with("/top-holders") => Some("indexer_errors"),
        StatusCode::BAD_GATEWAY => Some("contract_errors"),
        _ => None,
    }
}

impl<S, B> Service<ServiceRequest> for MetricsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let monitoring_manager = Arc::clone(&self.monitoring_manager);
        let start_time = Instant::now();

        Box::pin(async move {
            monitoring_manager.increment_metric("requests_total").await;

            let path = req.path().to_string();
            let method = req.method().to_string();
            if let Some(metric) = route_metric(&path) {
                monitoring_manager.increment_metric(metric).await;
            }

            let res = service.call(req).await;

            let response_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
            monitoring_manager.record_response_time(response_time_ms).await;

            match res {
                Ok(res) => {
                    let status = res.status();
                    if status.is_success() {
                        monitoring_manager.increment_metric("requests_successful").await;
                    } else {
                        monitoring_manager.increment_metric("requests_failed").await;
                        if let Some(metric) = failure_metric(&path, status) {
                            monitoring_manager.increment_metric(metric).await;
                        }
                    }
                    log::debug!("Request processed: {method} {path} - Status: {status} - Time: {response_time_ms:.2}ms");
                    Ok(res)
                }
                Err(e) => {
                    monitoring_manager.increment_metric("requests_failed").await;
                    log::error!("Request failed: {method} {path} - Error: {e} - Time: {response_time_ms:.2}ms");
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_metric() {
        assert_eq!(route_metric("/balance/0xabc"), Some("balance_queries"));
        assert_eq!(route_metric("/balance/batch"), Some("balance_queries"));
        assert_eq!(route_metric("/token-info"), Some("token_info_queries"));
        assert_eq!(route_metric("/top-holders"), Some("holder_queries"));
        assert_eq!(route_metric("/last-transaction/0xabc"), Some("activity_queries"));
        assert_eq!(route_metric("/health"), None);
    }

    #[test]
    fn test_failure_metric() {
        assert_eq!(failure_metric("/balance/x", StatusCode::BAD_REQUEST), Some("validation_failures"));
        assert_eq!(failure_metric("/balance/x", StatusCode::SERVICE_UNAVAILABLE), Some("rpc_errors"));
        assert_eq!(failure_metric("/token-info", StatusCode::BAD_GATEWAY), Some("contract_errors"));
        assert_eq!(failure_metric("/top-holders", StatusCode::BAD_GATEWAY), Some("indexer_errors"));
        assert_eq!(failure_metric("/top-holders", StatusCode::SERVICE_UNAVAILABLE), Some("indexer_errors"));
        assert_eq!(failure_metric("/health", StatusCode::NOT_FOUND), None);
    }
}
