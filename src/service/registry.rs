//! Client registry.
//!
//! Maps client ids to the session they were issued for. The actor writes
//! an entry per accepted connection; anything holding a clone can read.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::protocol::ClientId;

/// Metadata about one connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    pub client_id: ClientId,
    pub remote_addr: SocketAddr,
    pub connected_at: SystemTime,
}

/// Mutex-guarded map of client id → session. Clones share the map.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<Mutex<HashMap<ClientId, ClientSession>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ClientId, ClientSession>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a session for `remote_addr` under a fresh id that no tracked
    /// session uses.
    pub fn insert(&self, remote_addr: SocketAddr) -> ClientId {
        let mut clients = self.lock();
        let client_id = loop {
            let candidate = ClientId::generate();
            if !clients.contains_key(&candidate) {
                break candidate;
            }
        };

        clients.insert(
            client_id.clone(),
            ClientSession {
                client_id: client_id.clone(),
                remote_addr,
                connected_at: SystemTime::now(),
            },
        );
        client_id
    }

    pub fn get(&self, client_id: &ClientId) -> Option<ClientSession> {
        self.lock().get(client_id).cloned()
    }

    pub fn remove(&self, client_id: &ClientId) -> Option<ClientSession> {
        self.lock().remove(client_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn insert_get_remove() {
        let registry = ClientRegistry::new();
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();

        let id = registry.insert(addr);
        let session = registry.get(&id).unwrap();
        assert_eq!(session.client_id, id);
        assert_eq!(session.remote_addr, addr);

        assert!(registry.remove(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_inserts_get_distinct_ids() {
        let registry = ClientRegistry::new();
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..100).map(|_| registry.insert(addr)).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(!id.as_str().is_empty());
                assert!(seen.insert(id));
            }
        }
        assert_eq!(registry.len(), 800);
    }
}
