//! Constant-product swap math with exact integer semantics.
//!
//! Matches the on-chain pair contract bit for bit: a 0.3% fee applied
//! as `in * 997`, floor division throughout, never floating point.
//! Reserves are uint112 on-chain, so U256 intermediates cannot
//! overflow for any realistic input.

use alloy::primitives::{I256, U256};

const FEE_NUMERATOR: u64 = 997;
const FEE_DENOMINATOR: u64 = 1000;

/// One hop of a cyclic path: the reserve pair oriented in trade
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    /// Reserve of the token being sold into the pool.
    pub reserve_in: U256,
    /// Reserve of the token being bought out of the pool.
    pub reserve_out: U256,
}

/// Computes the exact swap output for one constant-product hop.
///
/// `floor(in * 997 * reserve_out / (reserve_in * 1000 + in * 997))`.
/// Zero input or an empty reserve short-circuits to zero rather than
/// dividing by zero.
pub fn swap_output(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::ZERO;
    }

    let amount_in_with_fee = amount_in * U256::from(FEE_NUMERATOR);
    let numerator = amount_in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(FEE_DENOMINATOR) + amount_in_with_fee;

    numerator / denominator
}

/// Folds `swap_output` across every hop of a cyclic path and returns
/// `final_output - amount_in`, signed. Negative profit means the fees
/// (and any adverse pricing) eat more than the discrepancy pays.
pub fn cyclic_profit(amount_in: U256, hops: &[Hop]) -> I256 {
    let mut amount = amount_in;
    for hop in hops {
        amount = swap_output(amount, hop.reserve_in, hop.reserve_out);
    }
    to_signed(amount) - to_signed(amount_in)
}

fn to_signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn zero_input_yields_zero_output() {
        assert_eq!(swap_output(U256::ZERO, u(1_000), u(1_000)), U256::ZERO);
    }

    #[test]
    fn empty_reserves_yield_zero_output() {
        assert_eq!(swap_output(u(100), U256::ZERO, u(1_000)), U256::ZERO);
        assert_eq!(swap_output(u(100), u(1_000), U256::ZERO), U256::ZERO);
    }

    #[test]
    fn matches_on_chain_formula() {
        // 100 * 997 * 1000 / (1000 * 1000 + 100 * 997) = 99_700_000 / 1_099_700 = 90 (floored)
        assert_eq!(swap_output(u(100), u(1_000), u(1_000)), u(90));
    }

    #[test]
    fn fee_always_costs_something_on_balanced_reserves() {
        // With equal reserves the pre-fee price is 1:1, so any positive
        // input must come out strictly smaller.
        for amount in [1u64, 10, 100, 999, 10_000] {
            let out = swap_output(u(amount), u(1_000_000), u(1_000_000));
            assert!(out < u(amount), "amount {amount} produced {out}");
        }
    }

    #[test]
    fn output_is_non_decreasing_in_input() {
        let reserves = (u(1_000_000), u(2_000_000));
        let mut last = U256::ZERO;
        for amount in (0u64..50_000).step_by(997) {
            let out = swap_output(u(amount), reserves.0, reserves.1);
            assert!(out >= last, "output decreased at input {amount}");
            last = out;
        }
    }

    #[test]
    fn handles_full_uint112_reserves_without_overflow() {
        let max_reserve = (U256::from(1u64) << 112) - U256::from(1u64);
        let out = swap_output(u(1_000_000_000), max_reserve, max_reserve);
        assert!(out < u(1_000_000_000));
        assert!(!out.is_zero());
    }

    #[test]
    fn mirrored_two_hop_cycle_loses_the_fee() {
        // Hop 2 is the exact inverse-priced pool of hop 1: no real
        // discrepancy, so the round trip must leak fees.
        let hops = [
            Hop {
                reserve_in: u(1_000),
                reserve_out: u(1_000),
            },
            Hop {
                reserve_in: u(1_000),
                reserve_out: u(1_000),
            },
        ];
        let profit = cyclic_profit(u(100), &hops);
        assert!(profit < I256::ZERO, "expected fee leakage, got {profit}");
    }

    #[test]
    fn genuine_discrepancy_turns_a_profit() {
        // Second pool prices the intermediate token 50% higher.
        let hops = [
            Hop {
                reserve_in: u(1_000_000),
                reserve_out: u(1_000_000),
            },
            Hop {
                reserve_in: u(1_000_000),
                reserve_out: u(1_500_000),
            },
        ];
        let profit = cyclic_profit(u(10_000), &hops);
        assert!(profit > I256::ZERO, "expected profit, got {profit}");
    }

    #[test]
    fn zero_input_cycle_is_zero_profit() {
        let hops = [Hop {
            reserve_in: u(1_000),
            reserve_out: u(1_000),
        }];
        assert_eq!(cyclic_profit(U256::ZERO, &hops), I256::ZERO);
    }

    #[test]
    fn empty_path_is_zero_profit() {
        assert_eq!(cyclic_profit(u(100), &[]), I256::ZERO);
    }
}
