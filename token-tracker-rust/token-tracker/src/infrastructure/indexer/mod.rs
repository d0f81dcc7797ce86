use async_trait::async_trait;
use ethers::core::types::Address;

use crate::domain::error::IndexerError;

pub mod blockscout;

pub use blockscout::BlockscoutIndexer;

/// External service that ranks token holders.
///
/// ERC-20 contracts keep no holder list, so ranking always comes from an
/// indexer that has already scanned the chain.
#[async_trait]
pub trait HolderIndexer: Send + Sync {
    /// At most `limit` holders of `contract`, largest first, as
    /// `{"items": [...]}` with each item in the indexer's own JSON shape.
    async fn fetch_top_holders(&self, contract: Address, limit: usize) -> Result<serde_json::Value, IndexerError>;
}
