//! Strike attempt state machine.
//!
//! `Sized -> Simulating -> {SimulationFailed | Submitting ->
//! {Submitted | SubmitFailed}}`. A simulation revert is a steady-state
//! outcome (the window usually closes before a transaction could land):
//! it costs nothing and is logged as protected capital. A submission
//! failure after a clean simulation is reported but never retried
//! within the tick; the next tick re-evaluates from fresh state.

use alloy::primitives::{B256, I256, U256};
use tracing::{info, warn};

use arb_rpc::RpcError;

use crate::executor::{StrikeRequest, StrikeTransport};

/// Phases of one strike attempt. `SimulationFailed`, `Submitted`, and
/// `SubmitFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikePhase {
    Sized,
    Simulating,
    SimulationFailed,
    Submitting,
    Submitted(B256),
    SubmitFailed,
}

/// Record of one attempt; created fresh per tick, never persisted.
#[derive(Debug, Clone)]
pub struct StrikeAttempt {
    pub amount_in: U256,
    pub expected_profit: I256,
    pub phase: StrikePhase,
}

impl StrikeAttempt {
    /// Transaction hash when the attempt reached submission.
    pub fn submitted(&self) -> Option<B256> {
        match self.phase {
            StrikePhase::Submitted(hash) => Some(hash),
            _ => None,
        }
    }
}

/// Runs one sized strike through simulation and, only on success,
/// submission.
///
/// Transport-class faults (timeouts, connection failures) propagate as
/// errors so the caller can rotate the endpoint; everything else
/// resolves to a terminal phase on the returned attempt.
#[tracing::instrument(skip(transport, request), fields(amount_in = %request.amount_in))]
pub async fn attempt_strike<T: StrikeTransport>(
    transport: &T,
    request: &StrikeRequest,
    expected_profit: I256,
    gas_price: U256,
) -> Result<StrikeAttempt, RpcError> {
    let mut attempt = StrikeAttempt {
        amount_in: request.amount_in,
        expected_profit,
        phase: StrikePhase::Simulating,
    };

    if let Err(e) = transport.simulate(request).await {
        if e.triggers_rotation() {
            return Err(e);
        }
        info!(
            amount_in = %request.amount_in,
            expected_profit = %expected_profit,
            "simulation reverted, capital protected: {e}"
        );
        attempt.phase = StrikePhase::SimulationFailed;
        return Ok(attempt);
    }

    attempt.phase = StrikePhase::Submitting;
    match transport.submit(request, gas_price).await {
        Ok(hash) => {
            info!(
                tx_hash = %hash,
                amount_in = %request.amount_in,
                expected_profit = %expected_profit,
                "strike submitted"
            );
            attempt.phase = StrikePhase::Submitted(hash);
        }
        Err(e) if e.triggers_rotation() => return Err(e),
        Err(e) => {
            warn!("submission failed after clean simulation, not retrying this tick: {e}");
            attempt.phase = StrikePhase::SubmitFailed;
        }
    }

    Ok(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn sample_request() -> StrikeRequest {
        StrikeRequest {
            executor: address!("5555555555555555555555555555555555555555"),
            router: address!("6666666666666666666666666666666666666666"),
            token_a: address!("7777777777777777777777777777777777777777"),
            token_b: address!("8888888888888888888888888888888888888888"),
            amount_in: U256::from(1_000_000u64),
        }
    }

    /// Stub executor that always reverts on simulate and counts any
    /// submission that slips through.
    struct AlwaysReverts {
        submissions: AtomicUsize,
    }

    impl StrikeTransport for AlwaysReverts {
        async fn simulate(&self, _request: &StrikeRequest) -> Result<(), RpcError> {
            Err(RpcError::Node {
                code: 3,
                message: "execution reverted".to_string(),
            })
        }

        async fn submit(&self, _request: &StrikeRequest, _gas: U256) -> Result<B256, RpcError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Ok(B256::ZERO)
        }
    }

    struct AlwaysAccepts {
        submissions: AtomicUsize,
    }

    impl StrikeTransport for AlwaysAccepts {
        async fn simulate(&self, _request: &StrikeRequest) -> Result<(), RpcError> {
            Ok(())
        }

        async fn submit(&self, _request: &StrikeRequest, _gas: U256) -> Result<B256, RpcError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Ok(B256::repeat_byte(0xab))
        }
    }

    struct MempoolRejects;

    impl StrikeTransport for MempoolRejects {
        async fn simulate(&self, _request: &StrikeRequest) -> Result<(), RpcError> {
            Ok(())
        }

        async fn submit(&self, _request: &StrikeRequest, _gas: U256) -> Result<B256, RpcError> {
            Err(RpcError::Node {
                code: -32000,
                message: "nonce too low".to_string(),
            })
        }
    }

    struct TimesOut;

    impl StrikeTransport for TimesOut {
        async fn simulate(&self, _request: &StrikeRequest) -> Result<(), RpcError> {
            Err(RpcError::Timeout(Duration::from_secs(4)))
        }

        async fn submit(&self, _request: &StrikeRequest, _gas: U256) -> Result<B256, RpcError> {
            Ok(B256::ZERO)
        }
    }

    #[tokio::test]
    async fn revert_protects_capital_and_never_submits() {
        let stub = AlwaysReverts {
            submissions: AtomicUsize::new(0),
        };

        let attempt = attempt_strike(&stub, &sample_request(), I256::ONE, U256::from(1u64))
            .await
            .unwrap();

        assert_eq!(attempt.phase, StrikePhase::SimulationFailed);
        assert_eq!(attempt.submitted(), None);
        assert_eq!(stub.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clean_simulation_submits_exactly_once() {
        let stub = AlwaysAccepts {
            submissions: AtomicUsize::new(0),
        };

        let attempt = attempt_strike(&stub, &sample_request(), I256::ONE, U256::from(1u64))
            .await
            .unwrap();

        assert_eq!(attempt.phase, StrikePhase::Submitted(B256::repeat_byte(0xab)));
        assert_eq!(attempt.submitted(), Some(B256::repeat_byte(0xab)));
        assert_eq!(stub.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submission_failure_is_terminal_not_retried() {
        let attempt = attempt_strike(&MempoolRejects, &sample_request(), I256::ONE, U256::from(1u64))
            .await
            .unwrap();

        assert_eq!(attempt.phase, StrikePhase::SubmitFailed);
    }

    #[tokio::test]
    async fn transport_fault_propagates_for_rotation() {
        let result = attempt_strike(&TimesOut, &sample_request(), I256::ONE, U256::from(1u64)).await;
        assert!(matches!(result, Err(RpcError::Timeout(_))));
    }
}
