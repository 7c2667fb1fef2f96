//! arb-exec: the simulate-before-send strike guard.
//!
//! Nothing state-changing leaves this crate without first passing a
//! read-only simulation of the exact call that would be submitted.

pub mod executor;
pub mod strike;

pub use executor::{RpcTransport, StrikeRequest, StrikeTransport, STRIKE_GAS_CEILING};
pub use strike::{attempt_strike, StrikeAttempt, StrikePhase};
