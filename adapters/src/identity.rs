//! Durable identity storage.
//!
//! One identity per address. Creation happens lazily on first login and the
//! only mutation is a role change.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::errors::StoreError;
use crate::models::{Address, Identity, Role};

/// Address-keyed identity store with get-or-create semantics.
#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    /// Fetch the identity for `address`, creating a patient identity if
    /// none exists. The flag is `true` only for the call that created it.
    async fn get_or_create(&self, address: &Address) -> Result<(Identity, bool), StoreError>;

    async fn get(&self, address: &Address) -> Result<Option<Identity>, StoreError>;

    /// Replace the role of an existing identity. `None` if unknown.
    async fn set_role(&self, address: &Address, role: Role)
        -> Result<Option<Identity>, StoreError>;
}

/// In-process [`IdentityRegistry`].
///
/// The map's entry API plays the part of a unique key on `address`: a racing
/// second creator finds the occupied entry and returns it instead.
#[derive(Debug, Default)]
pub struct MemoryIdentityRegistry {
    identities: DashMap<Address, Identity>,
}

impl MemoryIdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl IdentityRegistry for MemoryIdentityRegistry {
    async fn get_or_create(&self, address: &Address) -> Result<(Identity, bool), StoreError> {
        match self.identities.entry(*address) {
            Entry::Occupied(existing) => Ok((existing.get().clone(), false)),
            Entry::Vacant(slot) => {
                let identity = slot.insert(Identity::new(*address)).value().clone();
                log::info!("registered new identity {address}");
                Ok((identity, true))
            }
        }
    }

    async fn get(&self, address: &Address) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.get(address).map(|entry| entry.value().clone()))
    }

    async fn set_role(
        &self,
        address: &Address,
        role: Role,
    ) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.get_mut(address).map(|mut entry| {
            if entry.role != role {
                log::info!("role of {address} changed from {} to {role}", entry.role);
            }
            entry.role = role;
            entry.value().clone()
        }))
    }
}
