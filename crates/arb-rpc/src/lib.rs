//! arb-rpc: resilient data acquisition against unreliable EVM endpoints.
//!
//! Owns the per-network endpoint pool (rotation failover with a settle
//! window), the raw JSON-RPC connection layer, and the Multicall3 batched
//! reserve reader. All remote calls carry explicit timeouts; fault classes
//! are typed so callers can tell a rotation-worthy transport failure from
//! a configuration fault.

pub mod connection;
pub mod endpoint;
pub mod error;
pub mod multicall;

pub use connection::{Connection, FeeSnapshot};
pub use endpoint::EndpointPool;
pub use error::RpcError;
pub use multicall::{fetch_reserves, ReserveSnapshot, MIN_RESERVES_PAYLOAD};
