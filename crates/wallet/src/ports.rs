//! Collaborator seams
//!
//! The wallet does not talk to the network itself. Nonce lookup,
//! broadcasting and transaction history are supplied by the embedding
//! application through these traits.

use std::collections::HashMap;

use alloy_primitives::{Address, B256};
use anyhow::Result;
use parking_lot::RwLock;

/// Submits signed transactions to the network
pub trait Broadcaster: Send + Sync {
    /// Send raw signed transaction bytes; returns the transaction hash
    /// reported by the node.
    fn broadcast(&self, raw: &[u8]) -> Result<B256>;
}

/// Source of the next nonce for an account
pub trait NonceOracle: Send + Sync {
    fn get_nonce(&self, address: &Address) -> Result<u64>;
}

/// Key-value store for sent transactions
pub trait HistoryCache: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Process-local [`HistoryCache`]
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl HistoryCache for InMemoryHistory {
    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_history() {
        let history = InMemoryHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.get("0xabc").unwrap(), None);

        history.put("0xabc", &[1, 2, 3]).unwrap();
        history.put("0xabc", &[4]).unwrap();

        assert_eq!(history.get("0xabc").unwrap(), Some(vec![4]));
        assert_eq!(history.len(), 1);
    }
}
