//! Trade-executor boundary: call encoding, simulation, and submission.
//!
//! The executor contract itself is an external collaborator; this
//! module only shapes the call. [`StrikeTransport`] is the seam between
//! the strike state machine and the wire so tests can drive stubs.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use arb_rpc::{Connection, RpcError};

sol! {
    interface ITradeExecutor {
        function strike(address router, address tokenA, address tokenB, uint256 amountIn)
            external
            payable;
    }
}

/// Fixed gas-limit ceiling for a strike transaction. Deliberately above
/// the sizing gas budget so an unexpectedly expensive path reverts
/// instead of running out of gas mid-swap.
pub const STRIKE_GAS_CEILING: u64 = 600_000;

/// Fully-specified strike call: the same arguments feed both the
/// simulation and the real submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeRequest {
    /// Trade-executor contract address.
    pub executor: Address,
    /// Router the executor should trade through.
    pub router: Address,
    /// Input/output token of the cycle.
    pub token_a: Address,
    /// Intermediate token of the cycle.
    pub token_b: Address,
    /// Native-currency amount sent with the call.
    pub amount_in: U256,
}

impl StrikeRequest {
    /// ABI-encoded calldata for `strike(router, tokenA, tokenB, amountIn)`.
    pub fn calldata(&self) -> Bytes {
        ITradeExecutor::strikeCall {
            router: self.router,
            tokenA: self.token_a,
            tokenB: self.token_b,
            amountIn: self.amount_in,
        }
        .abi_encode()
        .into()
    }
}

/// Wire seam for the strike state machine.
pub trait StrikeTransport {
    /// Dry-runs the exact call that `submit` would send. An `Ok` means
    /// the transaction would not revert at the current state.
    fn simulate(
        &self,
        request: &StrikeRequest,
    ) -> impl std::future::Future<Output = Result<(), RpcError>> + Send;

    /// Signs and submits the real transaction, returning its hash.
    fn submit(
        &self,
        request: &StrikeRequest,
        gas_price: U256,
    ) -> impl std::future::Future<Output = Result<B256, RpcError>> + Send;
}

/// Production transport: eth_call for simulation, a signed legacy
/// transaction over `eth_sendRawTransaction` for submission.
pub struct RpcTransport<'a> {
    conn: &'a Connection,
}

impl<'a> RpcTransport<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl StrikeTransport for RpcTransport<'_> {
    async fn simulate(&self, request: &StrikeRequest) -> Result<(), RpcError> {
        // Same from/to/data/value as the submission; a revert surfaces
        // as a node error on eth_call.
        self.conn
            .call(
                self.conn.signer_address(),
                request.executor,
                &request.calldata(),
                request.amount_in,
            )
            .await
            .map(|_| ())
    }

    async fn submit(&self, request: &StrikeRequest, gas_price: U256) -> Result<B256, RpcError> {
        let signer = self
            .conn
            .signer()
            .ok_or_else(|| RpcError::Config("connection has no bound signer".to_string()))?;

        let nonce = self.conn.transaction_count(signer.address()).await?;

        let mut tx = TxLegacy {
            chain_id: Some(self.conn.chain_id()),
            nonce,
            gas_price: u128::try_from(gas_price).unwrap_or(u128::MAX),
            gas_limit: STRIKE_GAS_CEILING,
            to: TxKind::Call(request.executor),
            value: request.amount_in,
            input: request.calldata(),
        };

        let signature = signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| RpcError::Config(format!("signing failed: {e}")))?;
        let envelope = TxEnvelope::Legacy(tx.into_signed(signature));

        self.conn.send_raw_transaction(&envelope.encoded_2718()).await
    }
}
