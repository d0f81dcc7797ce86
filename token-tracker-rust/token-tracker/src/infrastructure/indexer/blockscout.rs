use std::time::Duration;

use async_trait::async_trait;
use ethers::core::types::Address;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::error::{ConfigError, IndexerError};
use crate::infrastructure::blockchain::ethereum::checksum;
use crate::infrastructure::indexer::HolderIndexer;

/// Blockscout REST API (`/api/v2/tokens/{address}/holders`).
///
/// The endpoint serves fixed-size pages (50 holders, largest first) and takes
/// no count parameter. Pages are followed through `next_page_params` until
/// `limit` holders are collected, and the result is cut to exactly `limit`.
pub struct BlockscoutIndexer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BlockscoutIndexer {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ConfigError> {
        reqwest::Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidValue(format!("holder indexer URL '{base_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("holder indexer client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn holders_url(&self, contract: &Address) -> String {
        format!("{}/api/v2/tokens/{}/holders", self.base_url, checksum(contract))
    }

    async fn fetch_page(&self, url: &str, page_params: &[(String, String)]) -> Result<Value, IndexerError> {
        let mut request = self.client.get(url).query(page_params);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("apikey", api_key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IndexerError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::BadStatus(status.as_u16(), body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| IndexerError::InvalidResponse(e.to_string()))
    }
}

/// `next_page_params` as query pairs. Absent or null means this was the last page.
fn next_page_query(page: &Value) -> Option<Vec<(String, String)>> {
    let params = page.get("next_page_params")?.as_object()?;
    let query = params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();
    Some(query)
}

#[async_trait]
impl HolderIndexer for BlockscoutIndexer {
    async fn fetch_top_holders(&self, contract: Address, limit: usize) -> Result<Value, IndexerError> {
        let url = self.holders_url(&contract);
        let mut holders: Vec<Value> = Vec::with_capacity(limit);
        let mut page_params = Vec::new();

        loop {
            debug!(%url, ?page_params, collected = holders.len(), limit, "Requesting holder page");
            let page = self.fetch_page(&url, &page_params).await?;

            let items = page
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| IndexerError::InvalidResponse("response has no `items` array".to_string()))?;
            if items.is_empty() {
                break;
            }
            holders.extend(items.iter().cloned());

            if holders.len() >= limit {
                break;
            }
            match next_page_query(&page) {
                Some(next) => page_params = next,
                None => break,
            }
        }

        holders.truncate(limit);
        Ok(json!({ "items": holders }))
    }
}
