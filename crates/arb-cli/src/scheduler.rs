//! Scan scheduler: the process-wide control loop.
//!
//! One pass per tick over all configured networks. Each network's cycle
//! is a single concurrent round trip (balance + fee snapshot + batched
//! reserves), then pure math, then — when sized, profitable, and fully
//! configured — a guarded strike. Faults stay inside the network they
//! happened on: transport faults rotate that network's endpoint, rate
//! limits back it off, and nothing short of startup misconfiguration
//! ever terminates the loop.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{I256, U256};
use eyre::Result;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use arb_engine::{
    build_cycle, cyclic_profit, padded_gas_price, trade_size, PoolReserves, SizingConfig,
};
use arb_exec::{attempt_strike, RpcTransport, StrikePhase, StrikeRequest};
use arb_rpc::{fetch_reserves, EndpointPool, RpcError};

use crate::config::{AppConfig, NetworkConfig};

/// Backoff applied to a network after an explicit rate-limit signal.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(3);

/// One network's immutable configuration plus its endpoint pool.
pub struct NetworkRuntime {
    pub config: NetworkConfig,
    pub pool: EndpointPool,
}

/// Per-network outcome of one tick, for logging and the `scan` report.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub network: String,
    pub ok: bool,
    pub alive: usize,
    pub total_pools: usize,
    pub balance: Option<U256>,
    pub profit: Option<I256>,
    pub strike: Option<StrikePhase>,
}

impl ScanReport {
    fn skipped(network: &str, total_pools: usize) -> Self {
        Self {
            network: network.to_string(),
            ok: true,
            alive: 0,
            total_pools,
            balance: None,
            profit: None,
            strike: None,
        }
    }

    fn failed(network: &str, total_pools: usize) -> Self {
        Self {
            ok: false,
            ..Self::skipped(network, total_pools)
        }
    }
}

/// Builds the per-network runtimes, probing each initial connection.
///
/// Probe failures are logged, not fatal: the first tick's transport
/// fault will rotate. Only an entirely unusable endpoint list fails.
pub async fn build_runtimes(config: &AppConfig) -> Result<Vec<Arc<NetworkRuntime>>> {
    let mut runtimes = Vec::with_capacity(config.networks.len());
    for net in &config.networks {
        let pool = EndpointPool::new(
            net.name.clone(),
            net.chain_id,
            net.endpoints.clone(),
            config.signer.clone(),
            config.call_timeout,
        )?;

        if let Some(conn) = pool.connection() {
            match conn.probe().await {
                Ok(block) => {
                    info!(network = %net.name, endpoint = %conn.url(), block, "connected")
                }
                Err(e) => {
                    warn!(network = %net.name, endpoint = %conn.url(), "startup probe failed: {e}")
                }
            }
        }

        runtimes.push(Arc::new(NetworkRuntime {
            config: net.clone(),
            pool,
        }));
    }
    Ok(runtimes)
}

/// One full scan cycle for one network.
///
/// All reads complete (or the cycle errors) before any decision is
/// made; there are no partial-data decisions.
#[tracing::instrument(skip_all, fields(network = %rt.config.name))]
async fn scan_cycle(rt: &NetworkRuntime, probe_amount: U256) -> Result<ScanReport, RpcError> {
    let net = &rt.config;
    let Some(conn) = rt.pool.connection() else {
        debug!("endpoint still settling after rotation, skipping tick");
        return Ok(ScanReport::skipped(&net.name, net.pools.len()));
    };

    let fees_fut = conn.fee_snapshot(net.priority_fee_wei);
    let reserves_fut = fetch_reserves(&conn, net.multicall, &net.pools);
    let (fees, snapshots, balance) = match conn.signer_address() {
        Some(owner) => {
            let (fees, snapshots, balance) =
                tokio::try_join!(fees_fut, reserves_fut, conn.native_balance(owner))?;
            (fees, snapshots, Some(balance))
        }
        None => {
            let (fees, snapshots) = tokio::try_join!(fees_fut, reserves_fut)?;
            (fees, snapshots, None)
        }
    };

    let alive = snapshots.iter().filter(|s| s.alive).count();
    let mut report = ScanReport {
        network: net.name.clone(),
        ok: true,
        alive,
        total_pools: net.pools.len(),
        balance,
        profit: None,
        strike: None,
    };

    let reserves: Vec<Option<PoolReserves>> = snapshots
        .iter()
        .map(|s| {
            s.alive.then_some(PoolReserves {
                reserve0: s.reserve0,
                reserve1: s.reserve1,
            })
        })
        .collect();
    let Some(hops) = build_cycle(&reserves, &net.cycle) else {
        debug!(alive, total = net.pools.len(), "cycle unavailable this tick");
        return Ok(report);
    };

    let sizing = SizingConfig {
        moat: net.moat_wei,
        priority_fee: fees.priority_fee,
        gas_budget: net.gas_budget,
    };
    let sized = balance.and_then(|b| trade_size(b, fees.gas_price, &sizing));
    let amount = sized.unwrap_or(probe_amount);

    let profit = cyclic_profit(amount, &hops);
    report.profit = Some(profit);
    if profit <= I256::ZERO {
        debug!(%amount, %profit, "cycle not profitable");
        return Ok(report);
    }

    match (sized, net.can_strike(), conn.signer()) {
        (Some(amount_in), true, Some(_)) => {
            let request = StrikeRequest {
                // can_strike() guarantees these are present.
                executor: net.executor.unwrap_or_default(),
                router: net.router.unwrap_or_default(),
                token_a: net.token_a.unwrap_or_default(),
                token_b: net.token_b.unwrap_or_default(),
                amount_in,
            };
            let transport = RpcTransport::new(&conn);
            let gas_price = padded_gas_price(fees.gas_price, fees.priority_fee);
            let attempt = attempt_strike(&transport, &request, profit, gas_price).await?;
            report.strike = Some(attempt.phase);
        }
        _ => {
            info!(%amount, %profit, "profitable cycle observed in watch mode");
        }
    }

    Ok(report)
}

/// Runs one cycle and absorbs its faults into the fault-class policy:
/// rotate on transport, back off on rate limit, log the rest.
async fn handle_cycle(rt: &NetworkRuntime, probe_amount: U256) -> ScanReport {
    match scan_cycle(rt, probe_amount).await {
        Ok(report) => {
            info!(
                network = %report.network,
                alive = report.alive,
                total = report.total_pools,
                profit = ?report.profit,
                "scan cycle complete"
            );
            report
        }
        Err(e) if e.triggers_rotation() => {
            warn!(network = %rt.config.name, "transport fault, rotating endpoint: {e}");
            rt.pool.rotate();
            ScanReport::failed(&rt.config.name, rt.config.pools.len())
        }
        Err(e) if e.is_rate_limit() => {
            warn!(network = %rt.config.name, "rate limited, backing off");
            tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
            ScanReport::failed(&rt.config.name, rt.config.pools.len())
        }
        Err(e) => {
            warn!(network = %rt.config.name, "scan cycle failed: {e}");
            ScanReport::failed(&rt.config.name, rt.config.pools.len())
        }
    }
}

/// One full pass over every network, sequentially or fanned out.
pub async fn run_pass(runtimes: &[Arc<NetworkRuntime>], config: &AppConfig) -> Vec<ScanReport> {
    if config.sequential {
        let mut reports = Vec::with_capacity(runtimes.len());
        for rt in runtimes {
            reports.push(handle_cycle(rt, config.probe_amount).await);
            tokio::time::sleep(config.inter_network_delay).await;
        }
        return reports;
    }

    // Fan out with independent failure isolation: settle every task and
    // keep going, so one network's panic cannot kill the pass.
    let handles: Vec<_> = runtimes
        .iter()
        .map(|rt| {
            let rt = Arc::clone(rt);
            let probe_amount = config.probe_amount;
            tokio::spawn(async move { handle_cycle(&rt, probe_amount).await })
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (rt, joined) in runtimes.iter().zip(join_all(handles).await) {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(network = %rt.config.name, "scan task panicked: {e}");
                reports.push(ScanReport::failed(&rt.config.name, rt.config.pools.len()));
            }
        }
    }
    reports
}

/// The forever loop: pass, sleep, repeat. Returns only if the runtimes
/// cannot be built at startup.
pub async fn run_forever(config: AppConfig) -> Result<()> {
    let runtimes = build_runtimes(&config).await?;
    info!(
        networks = runtimes.len(),
        interval_secs = config.scan_interval.as_secs(),
        sequential = config.sequential,
        "scheduler started"
    );

    loop {
        run_pass(&runtimes, &config).await;
        tokio::time::sleep(config.scan_interval).await;
    }
}

/// Single pass for the `scan` subcommand.
pub async fn run_once(config: AppConfig) -> Result<Vec<ScanReport>> {
    let runtimes = build_runtimes(&config).await?;
    Ok(run_pass(&runtimes, &config).await)
}
