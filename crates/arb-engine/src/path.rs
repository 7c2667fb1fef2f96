//! Cyclic path construction from per-tick reserve pairs.
//!
//! A cycle is described once in configuration as an ordered list of
//! hops, each naming a pool by index and a trade direction. Every tick
//! the live reserve pairs are threaded through that description; if any
//! referenced pool is dead this tick, the whole cycle is skipped (no
//! partial-data decisions).

use alloy::primitives::U256;

use crate::math::Hop;

/// Reserve pair for one pool, already known to be alive this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReserves {
    pub reserve0: U256,
    pub reserve1: U256,
}

/// One hop of the configured cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleHop {
    /// Index into the network's pool target list.
    pub pool_index: usize,
    /// `false` sells token0 for token1; `true` trades the other way.
    pub reversed: bool,
}

/// Threads this tick's reserves through the configured cycle.
///
/// Returns `None` when any hop references a pool that is dead or out of
/// range this tick, or when the cycle is empty.
pub fn build_cycle(reserves: &[Option<PoolReserves>], cycle: &[CycleHop]) -> Option<Vec<Hop>> {
    if cycle.is_empty() {
        return None;
    }

    cycle
        .iter()
        .map(|hop| {
            let pool = reserves.get(hop.pool_index).copied().flatten()?;
            Some(if hop.reversed {
                Hop {
                    reserve_in: pool.reserve1,
                    reserve_out: pool.reserve0,
                }
            } else {
                Hop {
                    reserve_in: pool.reserve0,
                    reserve_out: pool.reserve1,
                }
            })
        })
        .collect()
}
