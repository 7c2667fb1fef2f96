//! Batched reserve reads through the Multicall3 aggregator.
//!
//! One `tryAggregate(false, ...)` eth_call per network per tick fetches
//! every pool's `getReserves()` in a single round trip. The
//! non-reverting semantics matter: an individual pool may fail (wrong
//! interface, paused, gone) without aborting the batch, so each result
//! carries its own success flag and payload.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::error::RpcError;

sol! {
    interface IMulticall3 {
        struct Call {
            address target;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function tryAggregate(bool requireSuccess, Call[] calldata calls)
            external
            payable
            returns (Result[] memory returnData);
    }

    interface IUniswapV2Pair {
        function getReserves()
            external
            view
            returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }
}

/// Minimum returndata length for a full `getReserves` tuple: three
/// ABI words. A nominally successful call with a shorter payload is a
/// pool that is not alive, not a success.
pub const MIN_RESERVES_PAYLOAD: usize = 96;

/// One pool's reserve state for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveSnapshot {
    /// Pool contract address.
    pub pool: Address,
    /// Whether this tick produced a usable reserve pair.
    pub alive: bool,
    /// Reserve of token0 (uint112 on-chain, widened for math).
    pub reserve0: U256,
    /// Reserve of token1.
    pub reserve1: U256,
    /// Pool-reported timestamp of the last reserve update.
    pub timestamp: u32,
}

impl ReserveSnapshot {
    fn dead(pool: Address) -> Self {
        Self {
            pool,
            alive: false,
            reserve0: U256::ZERO,
            reserve1: U256::ZERO,
            timestamp: 0,
        }
    }
}

/// Encodes the batched `tryAggregate` call for the given pool targets.
fn encode_batch(pools: &[Address]) -> Bytes {
    let calls: Vec<IMulticall3::Call> = pools
        .iter()
        .map(|pool| IMulticall3::Call {
            target: *pool,
            callData: IUniswapV2Pair::getReservesCall {}.abi_encode().into(),
        })
        .collect();

    IMulticall3::tryAggregateCall {
        requireSuccess: false,
        calls,
    }
    .abi_encode()
    .into()
}

/// Decodes a raw `tryAggregate` response into per-pool snapshots.
///
/// A result is alive only when its success flag is set AND the payload
/// is long enough to hold the full reserve tuple; everything else is a
/// dead snapshot for this tick.
pub fn decode_snapshots(pools: &[Address], raw: &[u8]) -> Result<Vec<ReserveSnapshot>, RpcError> {
    let decoded = IMulticall3::tryAggregateCall::abi_decode_returns(raw, true)
        .map_err(|e| RpcError::Decode(format!("tryAggregate returndata: {e}")))?;

    if decoded.returnData.len() != pools.len() {
        return Err(RpcError::Decode(format!(
            "aggregator returned {} results for {} calls",
            decoded.returnData.len(),
            pools.len()
        )));
    }

    let snapshots = pools
        .iter()
        .zip(decoded.returnData)
        .map(|(pool, result)| {
            if !result.success || result.returnData.len() < MIN_RESERVES_PAYLOAD {
                return ReserveSnapshot::dead(*pool);
            }
            match IUniswapV2Pair::getReservesCall::abi_decode_returns(&result.returnData, true) {
                Ok(reserves) => ReserveSnapshot {
                    pool: *pool,
                    alive: true,
                    reserve0: U256::from(reserves.reserve0.to::<u128>()),
                    reserve1: U256::from(reserves.reserve1.to::<u128>()),
                    timestamp: reserves.blockTimestampLast,
                },
                Err(e) => {
                    debug!(pool = %pool, "undecodable getReserves payload: {e}");
                    ReserveSnapshot::dead(*pool)
                }
            }
        })
        .collect();

    Ok(snapshots)
}

/// Fetches reserves for every pool target in one batched round trip.
///
/// Transport faults (including the call timeout) propagate so the
/// caller can rotate the endpoint. Decode faults do NOT propagate: the
/// endpoint itself answered, so the batch degrades to all-dead
/// snapshots and rotation is left alone.
#[tracing::instrument(skip(conn, pools), fields(endpoint = %conn.url(), pools = pools.len()))]
pub async fn fetch_reserves(
    conn: &Connection,
    aggregator: Address,
    pools: &[Address],
) -> Result<Vec<ReserveSnapshot>, RpcError> {
    if pools.is_empty() {
        return Ok(Vec::new());
    }

    let calldata = encode_batch(pools);
    let raw = conn.call(None, aggregator, &calldata, U256::ZERO).await?;

    match decode_snapshots(pools, &raw) {
        Ok(snapshots) => Ok(snapshots),
        Err(e) => {
            warn!(aggregator = %aggregator, "batch decode failed, reporting zero alive pools: {e}");
            Ok(pools.iter().map(|p| ReserveSnapshot::dead(*p)).collect())
        }
    }
}
