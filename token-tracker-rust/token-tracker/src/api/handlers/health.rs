use actix_web::{get, HttpResponse, Responder};
use actix_web::web::Data;
use std::sync::Arc;

use crate::infrastructure::monitoring::manager::{MonitoringManager, ServiceMetrics};

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Token tracker is running"
    }))
}

#[get("/metrics")]
pub async fn get_metrics(monitoring_manager: Data<Arc<MonitoringManager>>) -> impl Responder {
    let metrics = monitoring_manager.get_metrics().await;

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(render_prometheus(&metrics))
}

fn render_prometheus(metrics: &ServiceMetrics) -> String {
    let counters = [
        ("requests_total", "Total number of HTTP requests", metrics.requests_total),
        ("requests_successful_total", "Requests answered with a 2xx status", metrics.requests_successful),
        ("requests_failed_total", "Requests answered with an error status", metrics.requests_failed),
        ("validation_failures_total", "Requests rejected as invalid input", metrics.validation_failures),
        ("rpc_errors_total", "Requests failed because the RPC node was unavailable", metrics.rpc_errors),
        ("contract_errors_total", "Requests failed because a contract call failed", metrics.contract_errors),
        ("indexer_errors_total", "Requests failed because the holder indexer failed", metrics.indexer_errors),
        ("balance_queries_total", "Balance lookups", metrics.balance_queries),
        ("token_info_queries_total", "Token metadata lookups", metrics.token_info_queries),
        ("holder_queries_total", "Top-holder lookups", metrics.holder_queries),
        ("activity_queries_total", "Last-transaction lookups", metrics.activity_queries),
    ];

    let mut out = String::new();
    for (name, help, value) in counters {
        out.push_str(&format!(
            "# HELP token_tracker_{name} {help}\n# TYPE token_tracker_{name} counter\ntoken_tracker_{name} {value}\n\n"
        ));
    }

    out.push_str(&format!(
        "# HELP token_tracker_response_time_avg_ms Average response time over recent requests\n\
         # TYPE token_tracker_response_time_avg_ms gauge\n\
         token_tracker_response_time_avg_ms {:.2}\n\n\
         # HELP token_tracker_uptime_seconds Seconds since the service started\n\
         # TYPE token_tracker_uptime_seconds gauge\n\
         token_tracker_uptime_seconds {:.0}\n",
        metrics.response_time_avg_ms, metrics.uptime_seconds
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::metrics::MetricsMiddleware;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_metrics_counts_requests() {
        let monitoring_manager = Arc::new(MonitoringManager::new());
        let app = test::init_service(
            App::new()
                .wrap(MetricsMiddleware::new(Arc::clone(&monitoring_manager)))
                .app_data(web::Data::new(Arc::clone(&monitoring_manager)))
                .service(health)
                .service(get_metrics),
        )
        .await;

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/health").to_request();
            test::call_service(&app, req).await;
        }
        let req = test::TestRequest::get().uri("/missing").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("token_tracker_requests_total 5\n"));
        assert!(text.contains("token_tracker_requests_successful_total 3\n"));
        assert!(text.contains("token_tracker_requests_failed_total 1\n"));
        assert!(text.contains("# TYPE token_tracker_uptime_seconds gauge"));
    }
}
