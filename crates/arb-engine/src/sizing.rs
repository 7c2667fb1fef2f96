//! Trade sizing from wallet balance and fee-market data.
//!
//! The "100% squeeze": everything in the wallet minus an overhead that
//! is never put at risk. Overhead = the configured moat plus the
//! estimated execution cost (padded gas price times an assumed gas
//! budget). Integer arithmetic only; the 1.2x safety pad is 12/10.

use alloy::primitives::U256;

/// Gas price safety multiplier, expressed as a ratio to stay float-free.
const GAS_PAD_NUMERATOR: u64 = 12;
const GAS_PAD_DENOMINATOR: u64 = 10;

/// Per-network sizing parameters, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingConfig {
    /// Minimum balance kept untouched, in wei.
    pub moat: U256,
    /// Priority fee added on top of the padded gas price, in wei.
    pub priority_fee: U256,
    /// Assumed gas consumption of one strike transaction.
    pub gas_budget: u64,
}

/// Gas price padded by the safety multiplier with the priority fee on
/// top; also the price a submitted strike bids.
pub fn padded_gas_price(gas_price: U256, priority_fee: U256) -> U256 {
    gas_price * U256::from(GAS_PAD_NUMERATOR) / U256::from(GAS_PAD_DENOMINATOR) + priority_fee
}

/// Estimated wei cost of executing one strike at the current gas price,
/// plus the moat.
pub fn execution_overhead(gas_price: U256, config: &SizingConfig) -> U256 {
    config.moat + padded_gas_price(gas_price, config.priority_fee) * U256::from(config.gas_budget)
}

/// Trade size for this tick, or `None` when the balance cannot cover
/// the overhead (no strike is attempted).
pub fn trade_size(balance: U256, gas_price: U256, config: &SizingConfig) -> Option<U256> {
    let overhead = execution_overhead(gas_price, config);
    let size = balance.checked_sub(overhead)?;
    if size.is_zero() {
        None
    } else {
        Some(size)
    }
}
