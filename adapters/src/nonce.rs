//! Challenge nonce storage.
//!
//! A nonce is bound to one address, lives for a fixed TTL and can be taken
//! out exactly once. Issuing a new nonce for an address replaces the old one.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::errors::StoreError;
use crate::models::{Address, Nonce};

/// Default nonce lifetime.
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(300);

/// Expiring, single-use nonce storage keyed by address.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Generate and store a fresh nonce for `address`, discarding any
    /// nonce previously issued to it.
    async fn issue(&self, address: &Address) -> Result<Nonce, StoreError>;

    /// Remove and return the live nonce for `address`.
    ///
    /// Returns `None` when nothing was issued or the nonce expired. Of two
    /// concurrent calls for the same address at most one gets `Some`.
    async fn consume(&self, address: &Address) -> Result<Option<Nonce>, StoreError>;

    /// Drop every expired entry, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, StoreError>;
}

#[derive(Debug)]
struct NonceEntry {
    nonce: Nonce,
    expires_at: Instant,
}

impl NonceEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process [`NonceStore`] backed by a sharded concurrent map.
///
/// Expired entries are invisible to `consume` immediately; they only leave
/// memory on `consume` or `purge_expired`.
#[derive(Debug)]
pub struct MemoryNonceStore {
    entries: DashMap<Address, NonceEntry>,
    ttl: Duration,
}

impl MemoryNonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryNonceStore {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_TTL)
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn issue(&self, address: &Address) -> Result<Nonce, StoreError> {
        let nonce = Nonce::generate();
        let entry = NonceEntry {
            nonce: nonce.clone(),
            expires_at: Instant::now() + self.ttl,
        };

        if self.entries.insert(*address, entry).is_some() {
            log::debug!("replaced outstanding nonce for {address}");
        }
        Ok(nonce)
    }

    async fn consume(&self, address: &Address) -> Result<Option<Nonce>, StoreError> {
        // remove() holds the shard lock, so only one caller can take the entry
        let taken = self.entries.remove(address);
        let now = Instant::now();

        Ok(match taken {
            Some((_, entry)) if entry.is_live(now) => Some(entry.nonce),
            Some(_) => {
                log::debug!("nonce for {address} had expired");
                None
            }
            None => None,
        })
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}
