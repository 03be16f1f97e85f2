//! # Identity Resolver
//!
//! Maps external wallet addresses to internal users, auto-provisioning a
//! minimal row on first sight. The store's find-or-create is atomic, so two
//! callers racing on the same fresh address converge on one row.

use std::sync::Arc;

use agora_store::ProjectionStore;
use agora_types::{User, WalletAddress};
use tracing::debug;

use crate::errors::ReconcileError;

/// Resolves wallet addresses to users, creating them as needed.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn ProjectionStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn ProjectionStore>) -> Self {
        Self { store }
    }

    /// Resolve an already-parsed address. Never fails except on store
    /// unavailability.
    pub fn resolve(&self, address: &WalletAddress) -> Result<User, ReconcileError> {
        let user = self.store.find_or_create_user(address)?;
        debug!(address = %address, user_id = %user.id, "resolved identity");
        Ok(user)
    }

    /// Parse a raw address string, then resolve it.
    pub fn resolve_str(&self, raw: &str) -> Result<User, ReconcileError> {
        let address = WalletAddress::parse(raw)?;
        self.resolve(&address)
    }

    /// Look up without creating; used where an unknown caller can only be
    /// an imposter (e.g. ownership checks).
    pub fn lookup(&self, address: &WalletAddress) -> Result<Option<User>, ReconcileError> {
        Ok(self.store.find_user_by_address(address)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_store::InMemoryStore;

    #[test]
    fn test_resolve_twice_one_row() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = IdentityResolver::new(store);

        let a = resolver
            .resolve_str("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
            .unwrap();
        let b = resolver
            .resolve_str("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_bad_address_is_validation() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = IdentityResolver::new(store);
        assert!(matches!(
            resolver.resolve_str("not-an-address"),
            Err(ReconcileError::Validation(_))
        ));
    }

    #[test]
    fn test_lookup_does_not_create() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = IdentityResolver::new(store);
        let addr =
            WalletAddress::parse("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").unwrap();
        assert!(resolver.lookup(&addr).unwrap().is_none());
        resolver.resolve(&addr).unwrap();
        assert!(resolver.lookup(&addr).unwrap().is_some());
    }
}
