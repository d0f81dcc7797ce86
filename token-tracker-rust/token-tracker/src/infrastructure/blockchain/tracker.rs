use std::sync::Arc;
use std::time::Duration;

use ethers::{
    abi::{Abi, Detokenize, Tokenize},
    contract::{Contract, ContractError},
    core::types::{Address, Filter, H256, U256},
    providers::{Http, Middleware, MiddlewareError, Provider, ProviderError},
};
use tracing::{info, warn};

use crate::domain::error::{
    BlockchainError, ConfigError, IndexerError, TrackerError, TrackerResult, ValidationError,
};
use crate::domain::token::{to_token_amount, BalanceQueryResult, LastTransaction, LatestBlock, TokenInfo};
use crate::infrastructure::blockchain::{abi, ethereum};
use crate::infrastructure::config::Config;
use crate::infrastructure::indexer::{BlockscoutIndexer, HolderIndexer};
use crate::infrastructure::logger::Logger;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TRANSFER_SCAN_BLOCKS: u64 = 1_000_000;
const DEFAULT_TRANSFER_SCAN_CHUNK: u64 = 50_000;

/// Read-only view of one ERC-20 contract over JSON-RPC.
pub struct TokenBalanceTracker {
    provider: Arc<Provider<Http>>,
    contract: Contract<Provider<Http>>,
    contract_address: Address,
    abi: Abi,
    holder_indexer: Option<Arc<dyn HolderIndexer>>,
    rpc_timeout: Duration,
    max_batch_size: usize,
    default_holders_limit: usize,
    max_holders_limit: usize,
    transfer_scan_blocks: u64,
    transfer_scan_chunk: u64,
}

impl TokenBalanceTracker {
    /// Builds the tracker from configuration. No RPC request is made here.
    pub fn new(config: &Config) -> TrackerResult<Self> {
        let contract_address = ethereum::parse_address(&config.contract_address)
            .map_err(|e| ConfigError::InvalidValue(format!("contract address: {e}")))?;

        let abi = abi::load_configured_abi(&config.abi_path)?;
        let missing = abi::missing_methods(&abi);
        if !missing.is_empty() {
            warn!(abi_path = %config.abi_path, ?missing, "ABI lacks ERC-20 methods; calls to them will fail");
        }

        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ConfigError::InvalidValue(format!("RPC URL '{}': {}", config.rpc_url, e)))?;

        let holder_indexer = match &config.indexer.base_url {
            Some(base_url) => {
                let indexer = BlockscoutIndexer::new(base_url, config.indexer.api_key.clone(), config.rpc_timeout())?;
                Some(Arc::new(indexer) as Arc<dyn HolderIndexer>)
            }
            None => None,
        };

        Ok(Self::with_parts(provider, contract_address, abi, holder_indexer)
            .with_rpc_timeout(config.rpc_timeout())
            .with_limits(config.max_batch_size, config.indexer.default_limit, config.indexer.max_limit)
            .with_transfer_scan(config.transfer_scan_blocks, config.transfer_scan_chunk))
    }

    /// Assembles a tracker around an existing provider with default limits.
    pub fn with_parts(
        provider: Provider<Http>,
        contract_address: Address,
        abi: Abi,
        holder_indexer: Option<Arc<dyn HolderIndexer>>,
    ) -> Self {
        let provider = Arc::new(provider);
        let contract = Contract::new(contract_address, abi.clone(), Arc::clone(&provider));

        Self {
            provider,
            contract,
            contract_address,
            abi,
            holder_indexer,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            max_batch_size: 100,
            default_holders_limit: 10,
            max_holders_limit: 100,
            transfer_scan_blocks: DEFAULT_TRANSFER_SCAN_BLOCKS,
            transfer_scan_chunk: DEFAULT_TRANSFER_SCAN_CHUNK,
        }
    }

    /// Upper bound for every single RPC request.
    pub fn with_rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    /// Batch size and top-holder bounds.
    pub fn with_limits(mut self, max_batch_size: usize, default_holders_limit: usize, max_holders_limit: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self.default_holders_limit = default_holders_limit;
        self.max_holders_limit = max_holders_limit;
        self
    }

    /// Search window and `eth_getLogs` span for last-transaction lookups.
    pub fn with_transfer_scan(mut self, blocks: u64, chunk: u64) -> Self {
        self.transfer_scan_blocks = blocks;
        self.transfer_scan_chunk = chunk.max(1);
        self
    }

    /// Address of the configured token contract.
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Holder count used when a request names no limit.
    pub fn default_holders_limit(&self) -> usize {
        self.default_holders_limit
    }

    /// Balance of `address` in raw units and in token units.
    pub async fn get_balance(&self, address: &str) -> TrackerResult<BalanceQueryResult> {
        let holder = ethereum::parse_address(address)?;

        let raw: U256 = self.call(&self.contract, "balanceOf", holder).await?;
        let decimals: u8 = self.call(&self.contract, "decimals", ()).await?;

        let result = BalanceQueryResult::new(ethereum::checksum(&holder), raw, decimals)?;
        info!(address = %result.address, raw = %raw, balance = result.balance, "Fetched token balance");
        Ok(result)
    }

    /// Balances for several holders, in input order. `decimals()` is read once.
    pub async fn get_balances_batch(&self, addresses: &[String]) -> TrackerResult<Vec<BalanceQueryResult>> {
        if addresses.is_empty() {
            return Err(ValidationError::MissingField("addresses".to_string()).into());
        }
        if addresses.len() > self.max_batch_size {
            return Err(ValidationError::PayloadTooLarge(addresses.len()).into());
        }

        let holders = addresses
            .iter()
            .map(|address| ethereum::parse_address(address))
            .collect::<Result<Vec<_>, _>>()?;

        let decimals: u8 = self.call(&self.contract, "decimals", ()).await?;

        let mut results = Vec::with_capacity(holders.len());
        for holder in holders {
            let raw: U256 = self.call(&self.contract, "balanceOf", holder).await?;
            results.push(BalanceQueryResult::new(ethereum::checksum(&holder), raw, decimals)?);
        }

        Ok(results)
    }

    /// Metadata of the configured token.
    pub async fn get_token_info(&self) -> TrackerResult<TokenInfo> {
        self.read_token_info(&self.contract).await
    }

    /// Metadata of any ERC-20 token, read through the same ABI.
    pub async fn get_token_info_for(&self, token_address: &str) -> TrackerResult<TokenInfo> {
        let token = ethereum::parse_address(token_address)?;
        if token == self.contract_address {
            return self.get_token_info().await;
        }

        let contract = Contract::new(token, self.abi.clone(), Arc::clone(&self.provider));
        self.read_token_info(&contract).await
    }

    /// Latest block number known to the node.
    pub async fn get_last_block(&self) -> TrackerResult<LatestBlock> {
        let block_number = self.provider_call("eth_blockNumber", self.provider.get_block_number()).await?;
        Ok(LatestBlock { block_number: block_number.as_u64() })
    }

    /// Time of the newest `Transfer` from or to `address`. Walks back from the
    /// head in `transfer_scan_chunk` spans and stops at the first span with a
    /// match, or after `transfer_scan_blocks` blocks.
    pub async fn get_last_transaction_date(&self, address: &str) -> TrackerResult<LastTransaction> {
        let holder = ethereum::parse_address(address)?;
        let transfer_topic = self
            .abi
            .event("Transfer")
            .map_err(|e| BlockchainError::ContractCallFailure(format!("Transfer event: {e}")))?
            .signature();
        let holder_topic = H256::from(holder);

        let head = self.get_last_block().await?.block_number;
        let floor = head.saturating_sub(self.transfer_scan_blocks);

        let mut to_block = head;
        let last_block = loop {
            let from_block = to_block.saturating_sub(self.transfer_scan_chunk - 1).max(floor);
            let transfers = Filter::new()
                .address(self.contract_address)
                .topic0(transfer_topic)
                .from_block(from_block)
                .to_block(to_block);

            let sent = self
                .provider_call("eth_getLogs", self.provider.get_logs(&transfers.clone().topic1(holder_topic)))
                .await?;
            let received = self
                .provider_call("eth_getLogs", self.provider.get_logs(&transfers.topic2(holder_topic)))
                .await?;

            let newest = sent.iter().chain(received.iter()).filter_map(|log| log.block_number).max();
            if newest.is_some() || from_block <= floor {
                break newest;
            }
            to_block = from_block - 1;
        };

        let address = ethereum::checksum(&holder);
        let Some(block_number) = last_block else {
            info!(%address, head, floor, "No transfers in scanned window");
            return Ok(LastTransaction { address, block_number: None, timestamp: None });
        };

        let block = self
            .provider_call("eth_getBlockByNumber", self.provider.get_block(block_number))
            .await?
            .ok_or_else(|| BlockchainError::RpcUnavailable(format!("block {block_number} not returned by node")))?;
        let timestamp = chrono::DateTime::<chrono::Utc>::from_timestamp(block.timestamp.low_u64() as i64, 0)
            .ok_or_else(|| BlockchainError::RpcUnavailable(format!("block {block_number} has invalid timestamp {}", block.timestamp)))?;

        Ok(LastTransaction {
            address,
            block_number: Some(block_number.as_u64()),
            timestamp: Some(timestamp.to_rfc3339()),
        })
    }

    /// Top holders as reported by the external indexer, untouched.
    pub async fn get_top_holders(&self, limit: usize) -> TrackerResult<serde_json::Value> {
        if limit == 0 || limit > self.max_holders_limit {
            return Err(ValidationError::InvalidLimit(format!(
                "{limit} (expected 1..={})",
                self.max_holders_limit
            ))
            .into());
        }

        let indexer = self.holder_indexer.as_ref().ok_or(IndexerError::NotConfigured)?;

        indexer
            .fetch_top_holders(self.contract_address, limit)
            .await
            .map_err(|e| {
                Logger::indexer_call_failed(&ethereum::checksum(&self.contract_address), &e.to_string());
                e.into()
            })
    }

    async fn read_token_info(&self, contract: &Contract<Provider<Http>>) -> TrackerResult<TokenInfo> {
        let name: String = self.call(contract, "name", ()).await?;
        let symbol: String = self.call(contract, "symbol", ()).await?;
        let decimals: u8 = self.call(contract, "decimals", ()).await?;
        let total_supply: U256 = self.call(contract, "totalSupply", ()).await?;

        Ok(TokenInfo {
            address: ethereum::checksum(&contract.address()),
            name,
            symbol,
            decimals,
            total_supply,
            total_supply_tokens: to_token_amount(total_supply, decimals)?,
        })
    }

    async fn call<A, D>(&self, contract: &Contract<Provider<Http>>, method: &str, args: A) -> TrackerResult<D>
    where
        A: Tokenize,
        D: Detokenize,
    {
        let contract_address = ethereum::checksum(&contract.address());
        Logger::rpc_call(method, &contract_address);

        let call = contract
            .method::<A, D>(method, args)
            .map_err(|e| self.call_failed(method, &contract_address, BlockchainError::ContractCallFailure(format!("{method}: {e}"))))?;

        match tokio::time::timeout(self.rpc_timeout, call.call()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.call_failed(method, &contract_address, classify_contract_error(method, e))),
            Err(_) => Err(self.call_failed(method, &contract_address, self.timeout_error(method))),
        }
    }

    /// Raw provider request under the RPC timeout. Every failure is `RpcUnavailable`.
    async fn provider_call<T, F>(&self, method: &str, request: F) -> TrackerResult<T>
    where
        F: std::future::Future<Output = Result<T, ProviderError>>,
    {
        let contract_address = ethereum::checksum(&self.contract_address);
        Logger::rpc_call(method, &contract_address);

        match tokio::time::timeout(self.rpc_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.call_failed(
                method,
                &contract_address,
                BlockchainError::RpcUnavailable(format!("{method}: {e}")),
            )),
            Err(_) => Err(self.call_failed(method, &contract_address, self.timeout_error(method))),
        }
    }

    fn timeout_error(&self, method: &str) -> BlockchainError {
        BlockchainError::RpcUnavailable(format!(
            "{method} timed out after {}ms",
            self.rpc_timeout.as_millis()
        ))
    }

    fn call_failed(&self, method: &str, contract_address: &str, error: BlockchainError) -> TrackerError {
        Logger::rpc_call_failed(method, contract_address, &error.to_string());
        error.into()
    }
}

/// Transport and node failures are `RpcUnavailable`; anything the contract
/// itself rejected or could not answer is `ContractCallFailure`.
fn classify_contract_error(method: &str, error: ContractError<Provider<Http>>) -> BlockchainError {
    match error {
        ContractError::MiddlewareError { e } => {
            let reverted = e
                .as_error_response()
                .map(|response| response.message.to_lowercase().contains("revert"))
                .unwrap_or(false);
            if reverted {
                BlockchainError::ContractCallFailure(format!("{method}: {e}"))
            } else {
                BlockchainError::RpcUnavailable(format!("{method}: {e}"))
            }
        }
        ContractError::ProviderError { e } => BlockchainError::RpcUnavailable(format!("{method}: {e}")),
        other => BlockchainError::ContractCallFailure(format!("{method}: {other}")),
    }
}
