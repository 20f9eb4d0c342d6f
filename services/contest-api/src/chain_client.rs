//! Read-only chain access over Ethereum JSON-RPC
//!
//! Two lookups are served: the ether balance of an account and ENS reverse
//! resolution (`<addr>.addr.reverse` via the registry and the name's resolver).

use crate::config::{is_address, ChainConfig};
use crate::errors::{ContestApiError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use std::time::Duration;
use tracing::{debug, error};

/// `resolver(bytes32)` on the ENS registry
const RESOLVER_SELECTOR: &str = "0178b8bf";

/// `name(bytes32)` on a reverse resolver
const NAME_SELECTOR: &str = "691f3431";

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Account balance in ether
    async fn get_balance(&self, address: &str) -> Result<String>;

    /// Primary ENS name of an account, if one is set
    async fn lookup_address(&self, address: &str) -> Result<Option<String>>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct JsonRpcChainClient {
    rpc_url: String,
    ens_registry: String,
    client: Client,
}

impl JsonRpcChainClient {
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContestApiError::Internal(format!("Failed to build RPC client: {}", e)))?;

        Ok(JsonRpcChainClient {
            rpc_url: config.rpc_url.clone(),
            ens_registry: config.ens_registry.clone(),
            client,
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("RPC {} failed: {}", method, e);
                ContestApiError::ChainError(format!("{} request failed: {}", method, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ContestApiError::ChainError(format!(
                "{} failed with status {}: {}",
                method, status, error_text
            )));
        }

        let body = response.json::<RpcResponse>().await.map_err(|e| {
            ContestApiError::ChainError(format!("Failed to parse {} response: {}", method, e))
        })?;

        if let Some(err) = body.error {
            return Err(ContestApiError::ChainError(format!(
                "{} returned error {}: {}",
                method, err.code, err.message
            )));
        }

        body.result
            .ok_or_else(|| ContestApiError::ChainError(format!("{} returned no result", method)))
    }

    async fn eth_call(&self, to: &str, data: String) -> Result<Vec<u8>> {
        let result = self
            .rpc("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ContestApiError::ChainError("eth_call result is not a string".to_string()))?;
        decode_hex(raw)
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn get_balance(&self, address: &str) -> Result<String> {
        if !is_address(address) {
            return Err(ContestApiError::Validation(format!("Invalid account: {}", address)));
        }

        let result = self.rpc("eth_getBalance", json!([address, "latest"])).await?;
        let raw = result.as_str().ok_or_else(|| {
            ContestApiError::ChainError("eth_getBalance result is not a string".to_string())
        })?;

        let wei = parse_quantity(raw)?;
        debug!(account = %address, wei = %wei, "Balance fetched");
        Ok(format_ether(wei))
    }

    async fn lookup_address(&self, address: &str) -> Result<Option<String>> {
        if !is_address(address) {
            return Err(ContestApiError::Validation(format!("Invalid account: {}", address)));
        }

        let reverse = format!("{}.addr.reverse", address[2..].to_lowercase());
        let node = hex::encode(namehash(&reverse));

        let resolver_word = self
            .eth_call(&self.ens_registry, format!("0x{}{}", RESOLVER_SELECTOR, node))
            .await?;
        let resolver = match word_to_address(&resolver_word) {
            Some(resolver) => resolver,
            None => return Ok(None),
        };

        let encoded = self
            .eth_call(&resolver, format!("0x{}{}", NAME_SELECTOR, node))
            .await?;
        let name = decode_abi_string(&encoded)?;

        Ok(name.filter(|name| !name.is_empty()))
    }
}

/// ENS namehash: `keccak(namehash(parent) ++ keccak(label))`, root is 32 zero bytes
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }

    for label in name.rsplit('.') {
        let label_hash = Keccak256::digest(label.as_bytes());
        let mut hasher = Keccak256::new();
        hasher.update(node);
        hasher.update(label_hash);
        node.copy_from_slice(&hasher.finalize());
    }
    node
}

/// Wei amount as a decimal ether string (`1.0`, `0.25`)
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    let fraction = format!("{:018}", fraction);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}

fn parse_quantity(raw: &str) -> Result<u128> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ContestApiError::ChainError(format!("Invalid quantity {}: {}", raw, e)))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>> {
    hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
        .map_err(|e| ContestApiError::ChainError(format!("Invalid hex data: {}", e)))
}

/// Last 20 bytes of an ABI word, `None` for the zero address
fn word_to_address(word: &[u8]) -> Option<String> {
    if word.len() < 32 {
        return None;
    }
    let address = &word[12..32];
    if address.iter().all(|b| *b == 0) {
        return None;
    }
    Some(format!("0x{}", hex::encode(address)))
}

/// Read an ABI word as an offset or length
fn word_to_usize(word: &[u8]) -> Option<usize> {
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..32]);
    usize::try_from(u64::from_be_bytes(tail)).ok()
}

/// Decode an ABI-encoded dynamic `string` return value
fn decode_abi_string(data: &[u8]) -> Result<Option<String>> {
    if data.is_empty() {
        return Ok(None);
    }

    let malformed = || ContestApiError::ChainError("Malformed ABI string".to_string());

    let offset = data.get(..32).and_then(word_to_usize).ok_or_else(malformed)?;
    let length = offset
        .checked_add(32)
        .and_then(|end| data.get(offset..end))
        .and_then(word_to_usize)
        .ok_or_else(malformed)?;
    let start = offset + 32;
    let bytes = start
        .checked_add(length)
        .and_then(|end| data.get(start..end))
        .ok_or_else(malformed)?;

    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|_| ContestApiError::ChainError("ENS name is not valid UTF-8".to_string()))
}
