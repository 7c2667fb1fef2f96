//! arb-engine: pure arbitrage math.
//!
//! Constant-product swap output, cyclic profit folding, path
//! construction from reserve pairs, and trade sizing. No I/O, no state;
//! everything here unit-tests without a network.

pub mod math;
pub mod path;
pub mod sizing;

pub use math::{cyclic_profit, swap_output, Hop};
pub use path::{build_cycle, CycleHop, PoolReserves};
pub use sizing::{execution_overhead, padded_gas_price, trade_size, SizingConfig};
