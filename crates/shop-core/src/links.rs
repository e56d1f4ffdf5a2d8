//! # Download-Link Registry
//!
//! In-memory map of single-use download codes to item ids.
//!
//! Every entry carries its own expiry timestamp. Redemption removes the entry
//! under the lock, so a code resolves at most once no matter how many requests
//! race for it. Expired entries are rejected on redemption and physically
//! dropped by a periodic sweep.
//!
//! ```text
//!   issue()          redeem()
//!  ────────▶ Issued ──────────▶ Redeemed
//!               │
//!               │ ttl elapsed / sweep
//!               ▼
//!            Expired
//! ```

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, trace};
use uuid::Uuid;

/// Default lifetime of a download code (10 minutes)
pub const DEFAULT_LINK_TTL: Duration = Duration::from_secs(10 * 60);

/// Opaque, unguessable download token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadCode(String);

impl DownloadCode {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DownloadCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DownloadCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
struct LinkEntry {
    item_id: u32,
    expires_at: Instant,
}

impl LinkEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Registry of live download codes.
///
/// Cloning is cheap; clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct DownloadLinkRegistry {
    entries: Arc<Mutex<HashMap<String, LinkEntry>>>,
    ttl: Duration,
}

impl DownloadLinkRegistry {
    /// Create an empty registry whose codes live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Lifetime applied to newly issued codes
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code for `item_id`
    pub fn issue(&self, item_id: u32) -> DownloadCode {
        let code = DownloadCode::generate();
        let entry = LinkEntry {
            item_id,
            expires_at: Instant::now() + self.ttl,
        };

        self.lock().insert(code.0.clone(), entry);
        debug!(item_id, "Issued download code");

        code
    }

    /// Consume a code, returning the item it grants access to.
    ///
    /// Unknown, already redeemed and expired codes all yield
    /// `ShopError::DownloadCodeNotFound`.
    pub fn redeem(&self, code: &str) -> ShopResult<u32> {
        let entry = self
            .lock()
            .remove(code)
            .ok_or(ShopError::DownloadCodeNotFound)?;

        if entry.is_expired(Instant::now()) {
            trace!("Rejected expired download code");
            return Err(ShopError::DownloadCodeNotFound);
        }

        debug!(item_id = entry.item_id, "Redeemed download code");
        Ok(entry.item_id)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Run `purge_expired` every `period` on a detached task
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = period.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let purged = registry.purge_expired();
                if purged > 0 {
                    debug!(purged, "Swept expired download codes");
                }
            }
        })
    }

    /// Number of live (possibly expired but not yet swept) codes
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-updated:
    // every critical section is a single insert/remove/retain.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, LinkEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DownloadLinkRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TTL)
    }
}
