use actix_web::web;

use crate::domain::error::{TrackerError, ValidationError};

pub mod handlers;

pub use handlers::health::{health, get_metrics};
pub use handlers::token::{get_balance, get_balances_batch, get_token_info, get_token_info_for, get_top_holders, get_latest_block, get_last_transaction};

/// Registers every route plus JSON error bodies for rejected query strings and payloads.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        TrackerError::from(ValidationError::InvalidInput(err.to_string())).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
        TrackerError::from(ValidationError::InvalidInput(err.to_string())).into()
    }))
    .service(health)
    .service(get_metrics)
    .service(get_balances_batch)
    .service(get_balance)
    .service(get_token_info)
    .service(get_token_info_for)
    .service(get_top_holders)
    .service(get_latest_block)
    .service(get_last_transaction);
}
