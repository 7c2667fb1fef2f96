//! Shared test helpers.
//!
//! Factories for building raw Multicall3 response fixtures so the
//! decode-to-profit pipeline can be exercised without any network.

#![allow(dead_code)]

use alloy::primitives::aliases::U112;
use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;

use arb_rpc::multicall::{IMulticall3, IUniswapV2Pair};

/// ABI-encoded `getReserves()` returndata (exactly 96 bytes).
pub fn encoded_reserves(reserve0: u128, reserve1: u128, timestamp: u32) -> Bytes {
    IUniswapV2Pair::getReservesCall::abi_encode_returns(&(
        U112::from(reserve0),
        U112::from(reserve1),
        timestamp,
    ))
    .into()
}

/// One successful tryAggregate entry carrying a full reserve tuple.
pub fn alive_result(reserve0: u128, reserve1: u128) -> IMulticall3::Result {
    IMulticall3::Result {
        success: true,
        returnData: encoded_reserves(reserve0, reserve1, 1_700_000_000),
    }
}

/// A nominally-successful entry with an empty payload (a dead pool).
pub fn empty_result() -> IMulticall3::Result {
    IMulticall3::Result {
        success: true,
        returnData: Bytes::new(),
    }
}

/// Raw returndata of a whole `tryAggregate` response.
pub fn batch_response(results: Vec<IMulticall3::Result>) -> Vec<u8> {
    IMulticall3::tryAggregateCall::abi_encode_returns(&(results,))
}

/// Sequential placeholder pool addresses.
pub fn pool_addresses(count: usize) -> Vec<Address> {
    (1..=count as u8).map(Address::repeat_byte).collect()
}
