use actix_web::{App, HttpServer, web};

use std::sync::Arc;
use token_tracker::api;
use token_tracker::infrastructure::blockchain::TokenBalanceTracker;
use token_tracker::infrastructure::config::Config;
use token_tracker::infrastructure::logger::Logger;
use token_tracker::infrastructure::monitoring::manager::MonitoringManager;
use token_tracker::middleware::MetricsMiddleware;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {e}");
            return Err(std::io::Error::other(format!("Configuration initialization failed: {e}")));
        }
    };

    // Held for the lifetime of the process so buffered file logs are flushed
    let _log_guard = Logger::init(&config);

    log::info!("🚀 Starting token tracker...");
    log::info!("✅ Configuration loaded: {}", config.summary());

    let tracker = match TokenBalanceTracker::new(&config) {
        Ok(tracker) => {
            log::info!("✅ Token tracker initialized for contract {}", config.contract_address);
            Arc::new(tracker)
        }
        Err(e) => {
            log::error!("❌ Failed to initialize token tracker: {}", e);
            return Err(std::io::Error::other(format!("Token tracker initialization failed: {e}")));
        }
    };

    let monitoring_manager = Arc::new(MonitoringManager::new());
    log::info!("✅ Monitoring manager initialized successfully");

    log::info!("🌐 Listening on {}:{}", config.host, config.port);
    log::info!("📊 Environment: {}", config.environment);
    log::info!("🔗 RPC endpoint: {}", config.rpc_url);
    if config.indexer.base_url.is_none() {
        log::warn!("⚠️ HOLDER_INDEXER_URL is not set; /top-holders will answer 503");
    }

    HttpServer::new(move || {
        App::new()
            .wrap(MetricsMiddleware::new(Arc::clone(&monitoring_manager)))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(actix_cors::Cors::permissive())
            .app_data(web::Data::new(Arc::clone(&tracker)))
            .app_data(web::Data::new(Arc::clone(&monitoring_manager)))
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
