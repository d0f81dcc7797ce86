use actix_web::{get, post, HttpResponse};
use actix_web::web::{Data, Json, Path, Query};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::domain::error::TrackerError;
use crate::infrastructure::blockchain::tracker::TokenBalanceTracker;

#[derive(Debug, Deserialize)]
pub struct TopHoldersQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BatchBalanceRequest {
    pub addresses: Vec<String>,
}

#[get("/balance/{address}")]
pub async fn get_balance(
    tracker: Data<Arc<TokenBalanceTracker>>,
    address: Path<String>,
) -> Result<HttpResponse, TrackerError> {
    let balance = tracker.get_balance(&address.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[post("/balance/batch")]
pub async fn get_balances_batch(
    tracker: Data<Arc<TokenBalanceTracker>>,
    req: Json<BatchBalanceRequest>,
) -> Result<HttpResponse, TrackerError> {
    let balances = tracker.get_balances_batch(&req.addresses).await?;
    Ok(HttpResponse::Ok().json(json!({
        "count": balances.len(),
        "balances": balances,
    })))
}

#[get("/token-info")]
pub async fn get_token_info(
    tracker: Data<Arc<TokenBalanceTracker>>,
) -> Result<HttpResponse, TrackerError> {
    let info = tracker.get_token_info().await?;
    Ok(HttpResponse::Ok().json(info))
}

#[get("/token-info/{address}")]
pub async fn get_token_info_for(
    tracker: Data<Arc<TokenBalanceTracker>>,
    address: Path<String>,
) -> Result<HttpResponse, TrackerError> {
    let info = tracker.get_token_info_for(&address.into_inner()).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[get("/top-holders")]
pub async fn get_top_holders(
    tracker: Data<Arc<TokenBalanceTracker>>,
    query: Query<TopHoldersQuery>,
) -> Result<HttpResponse, TrackerError> {
    let limit = query.limit.unwrap_or_else(|| tracker.default_holders_limit());
    let holders = tracker.get_top_holders(limit).await?;
    Ok(HttpResponse::Ok().json(holders))
}

#[get("/block/latest")]
pub async fn get_latest_block(
    tracker: Data<Arc<TokenBalanceTracker>>,
) -> Result<HttpResponse, TrackerError> {
    let block = tracker.get_last_block().await?;
    Ok(HttpResponse::Ok().json(block))
}

#[get("/last-transaction/{address}")]
pub async fn get_last_transaction(
    tracker: Data<Arc<TokenBalanceTracker>>,
    address: Path<String>,
) -> Result<HttpResponse, TrackerError> {
    let last = tracker.get_last_transaction_date(&address.into_inner()).await?;
    Ok(HttpResponse::Ok().json(last))
}
