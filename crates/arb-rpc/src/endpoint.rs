//! Per-network endpoint pool with rotation failover.
//!
//! Each network owns an ordered, deduplicated list of candidate endpoint
//! URLs and a cursor into it. Rotation is the sole failover mechanism:
//! on a transport-class fault the cursor advances by one (modulo the
//! list length, never resetting) and a fresh [`Connection`] replaces the
//! current one wholesale. A per-pool rotation lock makes concurrent
//! rotation triggers collapse into a single reconnect, and a short
//! settle window after each reconnect keeps the scheduler from
//! hammering the fresh endpoint immediately.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use alloy::signers::local::PrivateKeySigner;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::RpcError;

/// Window after a rotation during which scans for the network are skipped.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Ordered candidate endpoints for one network plus the live connection.
pub struct EndpointPool {
    network: String,
    chain_id: u64,
    candidates: Vec<String>,
    signer: Option<PrivateKeySigner>,
    call_timeout: Duration,
    cursor: Mutex<usize>,
    current: RwLock<Arc<Connection>>,
    rotation: Mutex<()>,
    settle_until: Mutex<Option<Instant>>,
}

impl EndpointPool {
    /// Builds the pool and its initial connection.
    ///
    /// Candidates are tried in order until one constructs; unusable
    /// entries (malformed URLs) are logged and skipped. Fails only when
    /// the list is empty or no candidate is usable at all.
    pub fn new(
        network: impl Into<String>,
        chain_id: u64,
        candidates: Vec<String>,
        signer: Option<PrivateKeySigner>,
        call_timeout: Duration,
    ) -> Result<Self, RpcError> {
        let network = network.into();
        if candidates.is_empty() {
            return Err(RpcError::Config(format!(
                "network {network}: no endpoints configured"
            )));
        }

        let mut initial = None;
        for (index, url) in candidates.iter().enumerate() {
            match Connection::new(url, chain_id, signer.clone(), call_timeout) {
                Ok(conn) => {
                    initial = Some((index, conn));
                    break;
                }
                Err(e) => {
                    warn!(network = %network, endpoint = %url, "skipping unusable endpoint: {e}");
                }
            }
        }
        let (index, conn) = initial.ok_or_else(|| {
            RpcError::Config(format!("network {network}: no usable endpoints"))
        })?;

        Ok(Self {
            network,
            chain_id,
            candidates,
            signer,
            call_timeout,
            cursor: Mutex::new(index),
            current: RwLock::new(Arc::new(conn)),
            rotation: Mutex::new(()),
            settle_until: Mutex::new(None),
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Current cursor position into the candidate list.
    pub fn cursor(&self) -> usize {
        *self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the pool is inside its post-rotation settle window.
    pub fn is_settling(&self) -> bool {
        let guard = self.settle_until.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*guard, Some(deadline) if Instant::now() < deadline)
    }

    /// The live connection, or `None` while the pool is settling after
    /// a rotation.
    pub fn connection(&self) -> Option<Arc<Connection>> {
        if self.is_settling() {
            return None;
        }
        Some(Arc::clone(
            &self.current.read().unwrap_or_else(|e| e.into_inner()),
        ))
    }

    /// Advances to the next candidate endpoint.
    ///
    /// Returns `false` without touching any state when another rotation
    /// is already in flight, so a storm of triggers from one bad tick
    /// produces exactly one reconnect. The cursor advances even when the
    /// replacement connection fails to construct; the next transport
    /// fault then tries the candidate after that.
    pub fn rotate(&self) -> bool {
        let Ok(_guard) = self.rotation.try_lock() else {
            debug!(network = %self.network, "rotation already in flight, skipping");
            return false;
        };

        let index = {
            let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
            *cursor = (*cursor + 1) % self.candidates.len();
            *cursor
        };
        let url = &self.candidates[index];

        match Connection::new(url, self.chain_id, self.signer.clone(), self.call_timeout) {
            Ok(conn) => {
                *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(conn);
                *self.settle_until.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some(Instant::now() + SETTLE_DELAY);
                info!(
                    network = %self.network,
                    endpoint = %url,
                    index,
                    "rotated to next endpoint"
                );
            }
            Err(e) => {
                // The old connection stays in place; it will fault again
                // and the following rotation moves past this candidate.
                warn!(
                    network = %self.network,
                    endpoint = %url,
                    index,
                    "replacement connection failed to construct: {e}"
                );
            }
        }
        true
    }
}
