//! Startup configuration: loaded once, validated, immutable after.
//!
//! Networks and pool targets come from a JSON file; the signing
//! credential comes from the `ARB_PRIVATE_KEY` environment variable.
//! Validation is strict where running half-configured would be unsafe
//! (no networks, empty endpoint lists, execution without a credential)
//! and lenient where a partial setup still scans (bad pool addresses
//! are dropped with a warning and the affected cycle is disabled).

use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use eyre::{eyre, Context, Result};
use serde::Deserialize;
use tracing::warn;

use arb_engine::CycleHop;

/// Environment variable holding the hex-encoded signing key.
pub const CREDENTIAL_ENV: &str = "ARB_PRIVATE_KEY";

const DEFAULT_SCAN_INTERVAL_SECS: u64 = 4;
const DEFAULT_INTER_NETWORK_DELAY_MS: u64 = 1_500;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 4;
const DEFAULT_GAS_BUDGET: u64 = 250_000;
/// 0.001 native units: opportunity logging in watch mode.
const DEFAULT_PROBE_AMOUNT_WEI: u64 = 1_000_000_000_000_000;

#[derive(Debug, Deserialize)]
struct RawConfig {
    networks: Vec<RawNetwork>,
    scan_interval_secs: Option<u64>,
    inter_network_delay_ms: Option<u64>,
    call_timeout_secs: Option<u64>,
    sequential: Option<bool>,
    liveness_port: Option<u16>,
    probe_amount_wei: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    name: String,
    chain_id: u64,
    endpoints: Vec<String>,
    multicall: String,
    moat_wei: String,
    priority_fee_wei: Option<String>,
    gas_budget: Option<u64>,
    router: Option<String>,
    executor: Option<String>,
    token_a: Option<String>,
    token_b: Option<String>,
    pools: Vec<String>,
    #[serde(default)]
    cycle: Vec<RawHop>,
}

#[derive(Debug, Deserialize)]
struct RawHop {
    pool: usize,
    #[serde(default)]
    reversed: bool,
}

/// One network, fully validated. Immutable after load.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub endpoints: Vec<String>,
    pub multicall: Address,
    pub moat_wei: U256,
    pub priority_fee_wei: Option<U256>,
    pub gas_budget: u64,
    pub router: Option<Address>,
    pub executor: Option<Address>,
    pub token_a: Option<Address>,
    pub token_b: Option<Address>,
    pub pools: Vec<Address>,
    pub cycle: Vec<CycleHop>,
}

impl NetworkConfig {
    /// Whether this network carries everything a strike needs besides
    /// the credential.
    pub fn can_strike(&self) -> bool {
        self.router.is_some()
            && self.executor.is_some()
            && self.token_a.is_some()
            && self.token_b.is_some()
            && !self.cycle.is_empty()
    }
}

/// Whole-process configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub networks: Vec<NetworkConfig>,
    pub scan_interval: Duration,
    pub inter_network_delay: Duration,
    pub call_timeout: Duration,
    pub sequential: bool,
    pub liveness_port: Option<u16>,
    pub probe_amount: U256,
    pub signer: Option<PrivateKeySigner>,
}

/// Loads and validates configuration from `path`.
///
/// With `execute` set, a missing or malformed credential refuses to
/// start; without it the credential is ignored and the process runs in
/// watch mode.
pub fn load(path: &str, execute: bool) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {path}"))?;
    let signer = load_credential(execute)?;
    parse(&contents, signer)
}

fn load_credential(execute: bool) -> Result<Option<PrivateKeySigner>> {
    let raw = std::env::var(CREDENTIAL_ENV).ok();
    if !execute {
        return Ok(None);
    }
    let raw = raw.ok_or_else(|| {
        eyre!("execution is enabled but {CREDENTIAL_ENV} is not set; refusing to start")
    })?;
    let signer = raw
        .parse::<PrivateKeySigner>()
        .map_err(|e| eyre!("malformed {CREDENTIAL_ENV}: {e}"))?;
    Ok(Some(signer))
}

fn parse(contents: &str, signer: Option<PrivateKeySigner>) -> Result<AppConfig> {
    let raw: RawConfig = serde_json::from_str(contents).wrap_err("malformed config JSON")?;

    if raw.networks.is_empty() {
        return Err(eyre!("no networks configured; refusing to start"));
    }

    let networks = raw
        .networks
        .into_iter()
        .map(validate_network)
        .collect::<Result<Vec<_>>>()?;

    let probe_amount = match raw.probe_amount_wei {
        Some(s) => parse_u256(&s).wrap_err("probe_amount_wei")?,
        None => U256::from(DEFAULT_PROBE_AMOUNT_WEI),
    };

    Ok(AppConfig {
        networks,
        scan_interval: Duration::from_secs(
            raw.scan_interval_secs.unwrap_or(DEFAULT_SCAN_INTERVAL_SECS),
        ),
        inter_network_delay: Duration::from_millis(
            raw.inter_network_delay_ms
                .unwrap_or(DEFAULT_INTER_NETWORK_DELAY_MS),
        ),
        call_timeout: Duration::from_secs(
            raw.call_timeout_secs.unwrap_or(DEFAULT_CALL_TIMEOUT_SECS),
        ),
        sequential: raw.sequential.unwrap_or(false),
        liveness_port: raw.liveness_port,
        probe_amount,
        signer,
    })
}

fn validate_network(raw: RawNetwork) -> Result<NetworkConfig> {
    let name = raw.name;

    let endpoints = dedup_endpoints(&name, raw.endpoints);
    if endpoints.is_empty() {
        return Err(eyre!("network {name}: no endpoints configured"));
    }

    let multicall = parse_address(&raw.multicall)
        .wrap_err_with(|| format!("network {name}: bad multicall address"))?;

    // Pool targets: warn-and-drop on bad entries, remap cycle indices to
    // the retained list, and disable the cycle if a hop lost its pool.
    let mut pools = Vec::new();
    let mut remap = vec![None; raw.pools.len()];
    for (index, entry) in raw.pools.iter().enumerate() {
        match parse_address(entry) {
            Ok(address) => {
                remap[index] = Some(pools.len());
                pools.push(address);
            }
            Err(e) => warn!(network = %name, entry = %entry, "dropping invalid pool target: {e}"),
        }
    }

    let mut cycle = Vec::with_capacity(raw.cycle.len());
    let mut cycle_ok = true;
    for hop in &raw.cycle {
        match remap.get(hop.pool).copied().flatten() {
            Some(pool_index) => cycle.push(CycleHop {
                pool_index,
                reversed: hop.reversed,
            }),
            None => {
                cycle_ok = false;
                break;
            }
        }
    }
    if !cycle_ok {
        warn!(network = %name, "cycle references a dropped or unknown pool; cycle disabled");
        cycle.clear();
    }

    Ok(NetworkConfig {
        chain_id: raw.chain_id,
        endpoints,
        multicall,
        moat_wei: parse_u256(&raw.moat_wei)
            .wrap_err_with(|| format!("network {name}: bad moat_wei"))?,
        priority_fee_wei: raw
            .priority_fee_wei
            .as_deref()
            .map(parse_u256)
            .transpose()
            .wrap_err_with(|| format!("network {name}: bad priority_fee_wei"))?,
        gas_budget: raw.gas_budget.unwrap_or(DEFAULT_GAS_BUDGET),
        router: parse_optional_address(&name, "router", raw.router.as_deref())?,
        executor: parse_optional_address(&name, "executor", raw.executor.as_deref())?,
        token_a: parse_optional_address(&name, "token_a", raw.token_a.as_deref())?,
        token_b: parse_optional_address(&name, "token_b", raw.token_b.as_deref())?,
        pools,
        cycle,
        name,
    })
}

fn dedup_endpoints(network: &str, endpoints: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for url in endpoints {
        if seen.contains(&url) {
            warn!(network = %network, endpoint = %url, "dropping duplicate endpoint");
        } else {
            seen.push(url);
        }
    }
    seen
}

fn parse_address(s: &str) -> Result<Address> {
    s.trim()
        .parse::<Address>()
        .map_err(|e| eyre!("invalid address {s:?}: {e}"))
}

fn parse_optional_address(network: &str, field: &str, s: Option<&str>) -> Result<Option<Address>> {
    s.map(parse_address)
        .transpose()
        .wrap_err_with(|| format!("network {network}: bad {field}"))
}

fn parse_u256(s: &str) -> Result<U256> {
    s.trim()
        .parse::<U256>()
        .map_err(|e| eyre!("invalid integer {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> String {
        r#"{
            "scan_interval_secs": 5,
            "sequential": true,
            "networks": [
                {
                    "name": "polygon",
                    "chain_id": 137,
                    "endpoints": [
                        "https://rpc-a.invalid",
                        "https://rpc-b.invalid",
                        "https://rpc-a.invalid"
                    ],
                    "multicall": "0xcA11bde05977b3631167028862bE2a173976CA11",
                    "moat_wei": "10000000000000000",
                    "priority_fee_wei": "30000000000",
                    "pools": [
                        "0x1111111111111111111111111111111111111111",
                        "0x2222222222222222222222222222222222222222"
                    ],
                    "cycle": [
                        { "pool": 0 },
                        { "pool": 1, "reversed": true }
                    ]
                }
            ]
        }"#
        .to_string()
    }

    #[test]
    fn parses_a_complete_network() {
        let config = parse(&sample_json(), None).unwrap();
        assert_eq!(config.scan_interval, Duration::from_secs(5));
        assert!(config.sequential);

        let net = &config.networks[0];
        assert_eq!(net.name, "polygon");
        assert_eq!(net.chain_id, 137);
        assert_eq!(net.endpoints.len(), 2, "duplicate endpoint must be dropped");
        assert_eq!(net.pools.len(), 2);
        assert_eq!(net.cycle.len(), 2);
        assert!(net.cycle[1].reversed);
        assert_eq!(net.moat_wei, U256::from(10_000_000_000_000_000u64));
    }

    #[test]
    fn no_networks_is_fatal() {
        let result = parse(r#"{ "networks": [] }"#, None);
        assert!(result.is_err());
    }

    #[test]
    fn empty_endpoint_list_is_fatal() {
        let json = sample_json().replace(
            r#""https://rpc-a.invalid",
                        "https://rpc-b.invalid",
                        "https://rpc-a.invalid""#,
            "",
        );
        assert!(parse(&json, None).is_err());
    }

    #[test]
    fn invalid_pool_is_dropped_and_cycle_disabled() {
        let json = sample_json().replace("0x2222222222222222222222222222222222222222", "junk");
        let config = parse(&json, None).unwrap();
        let net = &config.networks[0];

        assert_eq!(net.pools.len(), 1, "bad pool target must be dropped");
        assert!(
            net.cycle.is_empty(),
            "cycle referencing a dropped pool must be disabled"
        );
        assert!(!net.can_strike());
    }

    #[test]
    fn invalid_multicall_is_fatal() {
        let json = sample_json().replace("0xcA11bde05977b3631167028862bE2a173976CA11", "junk");
        assert!(parse(&json, None).is_err());
    }

    #[test]
    fn watch_mode_network_cannot_strike() {
        let config = parse(&sample_json(), None).unwrap();
        // No router/executor/tokens configured.
        assert!(!config.networks[0].can_strike());
    }
}
