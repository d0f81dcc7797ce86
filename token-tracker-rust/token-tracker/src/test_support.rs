//! Mock JSON-RPC node shared by unit and handler tests.

use ethers::abi::{encode, Abi, Token};
use ethers::core::types::U256;
use ethers::providers::{Http, Provider};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::infrastructure::blockchain::abi;
use crate::infrastructure::blockchain::tracker::TokenBalanceTracker;

pub const BUNDLED_ABI_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/abi/erc20.json");
pub const TOKEN: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const HOLDER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

const BALANCE_OF: &str = "70a08231";
const DECIMALS: &str = "313ce567";
const NAME: &str = "06fdde03";
const SYMBOL: &str = "95d89b41";
const TOTAL_SUPPLY: &str = "18160ddd";

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

pub fn bundled_abi() -> Abi {
    abi::load_abi(BUNDLED_ABI_PATH).unwrap()
}

pub fn rpc_result(result: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result })
}

pub fn encode_uint(value: &str) -> String {
    hex_data(encode(&[Token::Uint(U256::from_dec_str(value).unwrap())]))
}

pub fn encode_string(value: &str) -> String {
    hex_data(encode(&[Token::String(value.to_string())]))
}

/// Left-pads an address into a 32-byte log topic.
pub fn address_topic(address: &str) -> String {
    format!("0x{:0>64}", address.trim_start_matches("0x").to_lowercase())
}

/// `eth_getLogs` entry for a `Transfer` of the test token.
pub fn transfer_log(from: &str, to: &str, block_number: u64) -> Value {
    json!({
        "address": TOKEN.to_lowercase(),
        "topics": [TRANSFER_TOPIC, address_topic(from), address_topic(to)],
        "data": encode_uint("1000"),
        "blockNumber": format!("{block_number:#x}"),
        "blockHash": format!("0x{block_number:064x}"),
        "transactionHash": format!("0x{:064x}", block_number + 1),
        "transactionIndex": "0x0",
        "logIndex": "0x0",
        "removed": false
    })
}

fn block_json(number: u64, timestamp: u64) -> Value {
    json!({
        "hash": format!("0x{number:064x}"),
        "parentHash": ZERO_HASH,
        "sha3Uncles": ZERO_HASH,
        "miner": "0x0000000000000000000000000000000000000000",
        "stateRoot": ZERO_HASH,
        "transactionsRoot": ZERO_HASH,
        "receiptsRoot": ZERO_HASH,
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "difficulty": "0x0",
        "totalDifficulty": "0x0",
        "number": format!("{number:#x}"),
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x0",
        "timestamp": format!("{timestamp:#x}"),
        "extraData": "0x",
        "mixHash": ZERO_HASH,
        "nonce": "0x0000000000000000",
        "baseFeePerGas": "0x7",
        "size": "0x220",
        "sealFields": [],
        "uncles": [],
        "transactions": []
    })
}

fn hex_data(bytes: Vec<u8>) -> String {
    format!("0x{}", ethers::utils::hex::encode(bytes))
}

pub struct MockNode {
    pub server: MockServer,
}

impl MockNode {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    pub fn provider(&self) -> Provider<Http> {
        Provider::<Http>::try_from(self.server.uri().as_str()).unwrap()
    }

    pub fn tracker(&self) -> TokenBalanceTracker {
        TokenBalanceTracker::with_parts(self.provider(), TOKEN.parse().unwrap(), bundled_abi(), None)
    }

    /// Answers `balanceOf` with `raw` and `decimals()` with `decimals`.
    pub async fn erc20(&self, raw: &str, decimals: u8) {
        self.respond(BALANCE_OF, encode_uint(raw)).await;
        self.respond(DECIMALS, encode_uint(&decimals.to_string())).await;
    }

    pub async fn metadata(&self, name: &str, symbol: &str, total_supply: &str) {
        self.respond(NAME, encode_string(name)).await;
        self.respond(SYMBOL, encode_string(symbol)).await;
        self.respond(TOTAL_SUPPLY, encode_uint(total_supply)).await;
    }

    pub async fn block_number(&self, number: u64) {
        Mock::given(method("POST"))
            .and(body_string_contains("eth_blockNumber"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(&format!("{number:#x}"))))
            .mount(&self.server)
            .await;
    }

    /// Answers every `eth_getLogs` with `logs`.
    pub async fn transfer_logs(&self, logs: Value) {
        self.respond_to("eth_getLogs", json!({ "jsonrpc": "2.0", "id": 1, "result": logs })).await;
    }

    /// Answers every `eth_getBlockByNumber` with block `number` mined at `timestamp`.
    pub async fn block(&self, number: u64, timestamp: u64) {
        self.respond_to("eth_getBlockByNumber", json!({ "jsonrpc": "2.0", "id": 1, "result": block_json(number, timestamp) }))
            .await;
    }

    pub async fn respond_to(&self, rpc_method: &str, body: Value) {
        Mock::given(method("POST"))
            .and(body_string_contains(rpc_method))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Requests received for one JSON-RPC method.
    pub async fn method_count(&self, rpc_method: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| String::from_utf8_lossy(&request.body).contains(rpc_method))
            .count()
    }

    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.map(|requests| requests.len()).unwrap_or(0)
    }

    async fn respond(&self, selector: &str, result: String) {
        Mock::given(method("POST"))
            .and(body_string_contains("eth_call"))
            .and(body_string_contains(selector))
            .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(&result)))
            .mount(&self.server)
            .await;
    }
}
