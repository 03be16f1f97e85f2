//! # Identity Resolution Flows
//!
//! Concurrent first-time resolution of one address must never produce two
//! user rows, on either store adapter.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agora_store::{InMemoryStore, ProjectionStore, SqliteStore};
    use agora_types::WalletAddress;

    const ADDR: &str = "0xAbCdEf0123456789aBcDeF0123456789abcdef01";

    fn race_resolution(store: Arc<dyn ProjectionStore>) -> usize {
        let address = WalletAddress::parse(ADDR).unwrap();
        let mut ids: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let address = address.clone();
                    scope.spawn(move || store.find_or_create_user(&address).unwrap().id)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        ids.sort();
        ids.dedup();
        ids.len()
    }

    #[test]
    fn test_concurrent_resolution_memory_store() {
        let store = Arc::new(InMemoryStore::new());
        assert_eq!(race_resolution(store), 1);
    }

    #[test]
    fn test_concurrent_resolution_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("agora.db")).unwrap());
        assert_eq!(race_resolution(store), 1);
    }

    #[test]
    fn test_mixed_case_resolution_shares_the_row() {
        let store = InMemoryStore::new();
        let lower = WalletAddress::parse(&ADDR.to_lowercase()).unwrap();
        let mixed = WalletAddress::parse(ADDR).unwrap();

        let a = store.find_or_create_user(&lower).unwrap();
        let b = store.find_or_create_user(&mixed).unwrap();
        assert_eq!(a.id, b.id);
    }
}
