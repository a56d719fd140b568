//! In-memory `DocumentStore`: versioned documents behind one lock.

use super::{CommitBatch, DocKey, Document, DocumentStore, StoreError, Versioned};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<DocKey, Versioned<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, key: &DocKey) -> Result<Option<Versioned<Document>>, StoreError> {
        let g = self
            .docs
            .read()
            .map_err(|_| StoreError::Unavailable("lock error".into()))?;
        Ok(g.get(key).cloned())
    }

    fn commit(&self, batch: CommitBatch) -> Result<(), StoreError> {
        let mut g = self
            .docs
            .write()
            .map_err(|_| StoreError::Unavailable("lock error".into()))?;
        let stale = batch
            .reads
            .iter()
            .any(|(key, seen)| g.get(key).map(|d| d.version) != *seen);
        if stale {
            return Err(StoreError::Conflict);
        }
        for (key, value) in batch.writes {
            let version = g.get(&key).map_or(1, |d| d.version + 1);
            g.insert(key, Versioned { version, value });
        }
        Ok(())
    }
}
