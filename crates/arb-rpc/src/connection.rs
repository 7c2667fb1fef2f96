//! JSON-RPC connection bound to a single endpoint URL.
//!
//! A `Connection` is built against exactly one candidate endpoint and is
//! replaced wholesale when the endpoint pool rotates; it is never
//! re-pointed in place. Every remote call is wrapped in an explicit
//! timeout so a stalled endpoint surfaces as [`RpcError::Timeout`]
//! instead of hanging the scan cycle.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::RpcError;

/// Default deadline for a single remote call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Deserialize)]
struct NodeError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<NodeError>,
}

/// Fee-market snapshot taken at the top of a scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSnapshot {
    /// Node-suggested gas price in wei (`eth_gasPrice`).
    pub gas_price: U256,
    /// Base fee of the latest block, zero on pre-1559 chains.
    pub base_fee: U256,
    /// Priority fee in wei: the configured hint when present, otherwise
    /// the node suggestion.
    pub priority_fee: U256,
}

/// Live client bound to one endpoint of one network.
pub struct Connection {
    client: Client,
    url: Url,
    chain_id: u64,
    signer: Option<PrivateKeySigner>,
    timeout: Duration,
}

impl Connection {
    /// Builds a connection against `url`.
    ///
    /// Fails only on a malformed URL; no network traffic happens here.
    pub fn new(
        url: &str,
        chain_id: u64,
        signer: Option<PrivateKeySigner>,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        let url = Url::parse(url)
            .map_err(|e| RpcError::Config(format!("malformed endpoint URL {url:?}: {e}")))?;

        Ok(Self {
            client: Client::new(),
            url,
            chain_id,
            signer,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn signer(&self) -> Option<&PrivateKeySigner> {
        self.signer.as_ref()
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Issues one JSON-RPC request and extracts the `result` field.
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = tokio::time::timeout(
            self.timeout,
            self.client.post(self.url.clone()).json(&payload).send(),
        )
        .await
        .map_err(|_| RpcError::Timeout(self.timeout))??;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcError::RateLimited);
        }
        let response = response.error_for_status()?;

        let body: RpcResponse<T> = tokio::time::timeout(self.timeout, response.json())
            .await
            .map_err(|_| RpcError::Timeout(self.timeout))??;

        if let Some(error) = body.error {
            return Err(RpcError::from_node(error.code, error.message));
        }

        body.result
            .ok_or_else(|| RpcError::Decode(format!("{method} returned no result")))
    }

    /// Connectivity probe via `eth_blockNumber`.
    pub async fn probe(&self) -> Result<u64, RpcError> {
        let hex: String = self.request("eth_blockNumber", json!([])).await?;
        parse_u64_hex(&hex)
    }

    /// Native-currency balance of `owner` at the latest block.
    pub async fn native_balance(&self, owner: Address) -> Result<U256, RpcError> {
        let hex: String = self
            .request("eth_getBalance", json!([format!("{owner:#x}"), "latest"]))
            .await?;
        parse_u256_hex(&hex)
    }

    /// Fetches the current fee-market state in one concurrent pair of
    /// calls. A configured `priority_hint` short-circuits the
    /// `eth_maxPriorityFeePerGas` lookup; nodes that lack that method
    /// degrade to a zero priority fee.
    #[tracing::instrument(skip(self), fields(endpoint = %self.url))]
    pub async fn fee_snapshot(&self, priority_hint: Option<U256>) -> Result<FeeSnapshot, RpcError> {
        let gas_fut = self.request::<String>("eth_gasPrice", json!([]));
        let block_fut = self.request::<Value>("eth_getBlockByNumber", json!(["latest", false]));
        let (gas_hex, block) = tokio::try_join!(gas_fut, block_fut)?;

        let gas_price = parse_u256_hex(&gas_hex)?;
        let base_fee = match block.get("baseFeePerGas").and_then(Value::as_str) {
            Some(hex) => parse_u256_hex(hex)?,
            None => U256::ZERO,
        };

        let priority_fee = match priority_hint {
            Some(hint) => hint,
            None => match self
                .request::<String>("eth_maxPriorityFeePerGas", json!([]))
                .await
            {
                Ok(hex) => parse_u256_hex(&hex)?,
                Err(RpcError::Node { .. }) => U256::ZERO,
                Err(e) => return Err(e),
            },
        };

        Ok(FeeSnapshot {
            gas_price,
            base_fee,
            priority_fee,
        })
    }

    /// Read-only `eth_call` against `to` with the given calldata and value.
    pub async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &Bytes,
        value: U256,
    ) -> Result<Bytes, RpcError> {
        let mut call = json!({
            "to": format!("{to:#x}"),
            "data": format!("0x{}", alloy::hex::encode(data)),
        });
        if let Some(from) = from {
            call["from"] = json!(format!("{from:#x}"));
        }
        if !value.is_zero() {
            call["value"] = json!(format!("0x{value:x}"));
        }

        let hex: String = self.request("eth_call", json!([call, "latest"])).await?;
        parse_bytes_hex(&hex)
    }

    /// Pending-state nonce for `owner`.
    pub async fn transaction_count(&self, owner: Address) -> Result<u64, RpcError> {
        let hex: String = self
            .request(
                "eth_getTransactionCount",
                json!([format!("{owner:#x}"), "pending"]),
            )
            .await?;
        parse_u64_hex(&hex)
    }

    /// Submits a signed raw transaction, returning its hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
        let hex: String = self
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", alloy::hex::encode(raw))]),
            )
            .await?;
        hex.parse::<B256>()
            .map_err(|e| RpcError::Decode(format!("bad transaction hash {hex:?}: {e}")))
    }
}

fn parse_u256_hex(hex: &str) -> Result<U256, RpcError> {
    U256::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Decode(format!("bad hex quantity {hex:?}: {e}")))
}

fn parse_u64_hex(hex: &str) -> Result<u64, RpcError> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Decode(format!("bad hex quantity {hex:?}: {e}")))
}

fn parse_bytes_hex(hex: &str) -> Result<Bytes, RpcError> {
    alloy::hex::decode(hex.trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|e| RpcError::Decode(format!("bad hex payload: {e}")))
}
