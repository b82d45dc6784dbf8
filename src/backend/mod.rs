//! The native protocol seam: what an adapter needs from a document store.
//!
//! Everything here speaks `bson::Document`. Implementations own their
//! connection handling; the adapter only issues one call per `exec`.

mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A collection within a logical database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self { database: database.into(), collection: collection.into() }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Native read options.
///
/// Semantics:
/// - `sort` is a document of `key: 1 | -1`, applied before `skip`/`limit`.
/// - `projection` is a document of `key: 1` inclusions; `_id` is kept unless `_id: 0`.
/// - `limit` of `None` or `Some(0)` returns every match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub skip: u64,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOutcome {
    pub ids: Vec<Bson>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// Index request: `keys` is a document of `key: 1 | -1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Document,
    pub unique: bool,
}

/// A document store client.
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// Short backend name for logs, e.g. `memory`.
    fn kind(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn find(
        &self,
        ns: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Ordered insert. Stops at the first failure, reporting how many documents landed.
    async fn insert(&self, ns: &Namespace, docs: Vec<Document>) -> Result<InsertOutcome, StoreError>;

    async fn update(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
        multi: bool,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn delete(&self, ns: &Namespace, filter: Document, multi: bool) -> Result<DeleteOutcome, StoreError>;

    /// Returns the index name.
    async fn create_index(&self, ns: &Namespace, index: IndexSpec) -> Result<String, StoreError>;
}
