//! Fault taxonomy for remote endpoint interactions.
//!
//! The scheduler's recovery action depends on the fault class, not the
//! message: hard transport faults rotate the endpoint, rate limits back
//! off, node-level and decode faults leave the connection alone (the
//! endpoint itself is healthy and the fault is configuration or data).

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the JSON-RPC connection layer.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The call did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS failure, non-2xx status.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint explicitly signalled "too many requests".
    #[error("endpoint rate limit hit")]
    RateLimited,

    /// The node accepted the request but returned a JSON-RPC error
    /// (reverts surface here for `eth_call`).
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    /// The response arrived but could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Local misuse or misconfiguration, never caused by the endpoint.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RpcError {
    /// Classify a JSON-RPC error object returned by the node.
    ///
    /// Some providers report rate limiting as a node error (-32005 or a
    /// "too many requests" message) rather than HTTP 429.
    pub(crate) fn from_node(code: i64, message: String) -> Self {
        let lowered = message.to_ascii_lowercase();
        if code == -32005 || lowered.contains("too many requests") || lowered.contains("rate limit")
        {
            RpcError::RateLimited
        } else {
            RpcError::Node { code, message }
        }
    }

    /// Whether this fault warrants rotating to the next endpoint.
    pub fn triggers_rotation(&self) -> bool {
        matches!(self, RpcError::Timeout(_) | RpcError::Transport(_))
    }

    /// Whether this fault should be answered with a backoff delay
    /// instead of a rotation.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, RpcError::RateLimited)
    }
}
