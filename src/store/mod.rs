//! Persistence collaborator: a keyed document store with optimistic transactions.
//!
//! A `Transaction` records the version of every document it reads and buffers
//! its writes. Commit succeeds only if none of those versions moved; otherwise
//! the store reports `Conflict` and `run_transaction` re-runs the body.

mod memory;

pub use memory::MemoryStore;

use crate::models::{Bracket, BracketId, EngineError, EngineResult, Match, MatchId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum DocKey {
    Bracket(BracketId),
    Match(BracketId, MatchId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Document {
    Bracket(Bracket),
    Match(Match),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Everything one transaction wants to commit.
#[derive(Clone, Debug, Default)]
pub struct CommitBatch {
    /// Keys read and the version seen (`None` = document was absent).
    pub reads: Vec<(DocKey, Option<u64>)>,
    pub writes: Vec<(DocKey, Document)>,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum StoreError {
    /// A document read by the transaction changed before commit.
    #[error("transaction conflict")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected document at {0}")]
    Corrupt(String),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Internal(e.to_string())
    }
}

pub trait DocumentStore: Send + Sync {
    fn read(&self, key: &DocKey) -> Result<Option<Versioned<Document>>, StoreError>;

    /// Apply `batch.writes` atomically if every `batch.reads` version still matches.
    fn commit(&self, batch: CommitBatch) -> Result<(), StoreError>;
}

/// One unit of work against a `DocumentStore`.
pub struct Transaction<'a> {
    store: &'a dyn DocumentStore,
    reads: HashMap<DocKey, Option<u64>>,
    writes: HashMap<DocKey, Document>,
}

impl<'a> Transaction<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            writes: HashMap::new(),
        }
    }

    /// Read a document, seeing this transaction's own buffered writes first.
    pub fn read(&mut self, key: DocKey) -> Result<Option<Document>, StoreError> {
        if let Some(doc) = self.writes.get(&key) {
            return Ok(Some(doc.clone()));
        }
        let found = self.store.read(&key)?;
        self.reads
            .entry(key)
            .or_insert_with(|| found.as_ref().map(|v| v.version));
        Ok(found.map(|v| v.value))
    }

    pub fn get_bracket(&mut self, id: BracketId) -> EngineResult<Option<Bracket>> {
        match self.read(DocKey::Bracket(id))? {
            None => Ok(None),
            Some(Document::Bracket(b)) => Ok(Some(b)),
            Some(_) => Err(StoreError::Corrupt(format!("bracket {id}")).into()),
        }
    }

    pub fn get_match(&mut self, bracket_id: BracketId, id: MatchId) -> EngineResult<Option<Match>> {
        match self.read(DocKey::Match(bracket_id, id))? {
            None => Ok(None),
            Some(Document::Match(m)) => Ok(Some(m)),
            Some(_) => Err(StoreError::Corrupt(format!("match {id}")).into()),
        }
    }

    pub fn put_bracket(&mut self, bracket: Bracket) {
        self.writes.insert(DocKey::Bracket(bracket.id), Document::Bracket(bracket));
    }

    pub fn put_match(&mut self, m: Match) {
        self.writes.insert(DocKey::Match(m.bracket_id, m.id), Document::Match(m));
    }

    /// Read-only transactions still validate their reads, so a snapshot that
    /// straddled another commit comes back as `Conflict`.
    pub fn commit(self) -> Result<(), StoreError> {
        if self.writes.is_empty() && self.reads.is_empty() {
            return Ok(());
        }
        self.store.commit(CommitBatch {
            reads: self.reads.into_iter().collect(),
            writes: self.writes.into_iter().collect(),
        })
    }
}

/// Run `body` in a transaction, retrying on conflict up to `max_attempts` times.
///
/// An `Err` from `body` aborts the attempt with nothing written and is returned as-is.
/// Running out of attempts surfaces as `Internal`.
pub fn run_transaction<T, F>(store: &dyn DocumentStore, max_attempts: u32, mut body: F) -> EngineResult<T>
where
    F: FnMut(&mut Transaction<'_>) -> EngineResult<T>,
{
    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        let mut tx = Transaction::new(store);
        let value = body(&mut tx)?;
        match tx.commit() {
            Ok(()) => return Ok(value),
            Err(StoreError::Conflict) => {
                log::debug!("transaction conflict (attempt {}/{}), retrying", attempt, attempts);
            }
            Err(e) => return Err(e.into()),
        }
    }
    log::warn!("transaction gave up after {} conflicting attempts", attempts);
    Err(EngineError::Internal(format!(
        "transaction conflicted {attempts} times"
    )))
}
