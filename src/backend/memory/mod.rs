//! In-process document store implementing [`Backend`].
//!
//! Documents live in insertion order per namespace. Every collection carries
//! the `_id_` unique index; further indexes come from `create_index`.

mod eval;
mod index;
mod update;

use self::index::{MemIndex, check_unique, verify_existing};
use super::{Backend, DeleteOutcome, FindOptions, IndexSpec, InsertOutcome, Namespace, StoreError, UpdateOutcome};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct MemCollection {
    docs: Vec<Document>,
    indexes: Vec<MemIndex>,
}

impl Default for MemCollection {
    fn default() -> Self {
        Self { docs: Vec::new(), indexes: vec![MemIndex::primary()] }
    }
}

#[derive(Debug)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<Namespace, MemCollection>>,
    latency: Duration,
    reachable: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self { collections: RwLock::new(HashMap::new()), latency: Duration::ZERO, reachable: AtomicBool::new(true) }
    }

    /// Delays every call by `latency` before touching any data.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Simulates losing (or regaining) the connection.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of documents currently stored in `ns`.
    #[must_use]
    pub fn len(&self, ns: &Namespace) -> usize {
        self.collections.read().get(ns).map_or(0, |c| c.docs.len())
    }

    #[must_use]
    pub fn is_empty(&self, ns: &Namespace) -> bool {
        self.len(ns) == 0
    }

    /// Index names on `ns`, `_id_` first.
    #[must_use]
    pub fn index_names(&self, ns: &Namespace) -> Vec<String> {
        self.collections
            .read()
            .get(ns)
            .map(|c| c.indexes.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default()
    }

    async fn round_trip(&self) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unreachable("memory backend is offline".into()))
        }
    }
}

fn with_id(doc: Document) -> (Document, Bson) {
    if let Some(id) = doc.get("_id") {
        let id = id.clone();
        return (doc, id);
    }
    let id = Bson::ObjectId(ObjectId::new());
    let mut out = Document::new();
    out.insert("_id", id.clone());
    for (k, v) in doc {
        out.insert(k, v);
    }
    (out, id)
}

fn matching_positions(docs: &[Document], filter: &Document, multi: bool) -> Result<Vec<usize>, StoreError> {
    let mut out = Vec::new();
    for (pos, doc) in docs.iter().enumerate() {
        if eval::matches(doc, filter)? {
            out.push(pos);
            if !multi {
                break;
            }
        }
    }
    Ok(out)
}

#[async_trait]
impl Backend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.round_trip().await
    }

    async fn find(
        &self,
        ns: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.round_trip().await?;
        let sort = options.sort.as_ref().map(eval::parse_sort).transpose()?;

        let collections = self.collections.read();
        let Some(coll) = collections.get(ns) else {
            return Ok(Vec::new());
        };
        let mut hits = Vec::new();
        for doc in &coll.docs {
            if eval::matches(doc, &filter)? {
                hits.push(doc);
            }
        }

        if let Some(sort) = sort.as_deref().filter(|s| !s.is_empty()) {
            hits.sort_by(|a, b| eval::compare_docs(a, b, sort));
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let take = match options.limit {
            None | Some(0) => usize::MAX,
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        };
        hits.into_iter()
            .skip(skip)
            .take(take)
            .map(|doc| match &options.projection {
                Some(p) if !p.is_empty() => eval::project(doc, p),
                _ => Ok(doc.clone()),
            })
            .collect()
    }

    async fn insert(&self, ns: &Namespace, docs: Vec<Document>) -> Result<InsertOutcome, StoreError> {
        self.round_trip().await?;
        let mut collections = self.collections.write();
        let coll = collections.entry(ns.clone()).or_default();
        let attempted = docs.len() as u64;
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            let (doc, id) = with_id(doc);
            if let Err(e) = check_unique(&coll.indexes, &coll.docs, &doc, None) {
                return Err(StoreError::Interrupted { applied: ids.len() as u64, attempted, source: Box::new(e) });
            }
            coll.docs.push(doc);
            ids.push(id);
        }
        Ok(InsertOutcome { ids })
    }

    async fn update(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
        multi: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        self.round_trip().await?;
        update::validate(&update)?;
        let mut collections = self.collections.write();
        let Some(coll) = collections.get_mut(ns) else {
            return Ok(UpdateOutcome::default());
        };
        let positions = matching_positions(&coll.docs, &filter, multi)?;
        let mut outcome = UpdateOutcome { matched: positions.len() as u64, modified: 0 };
        for pos in positions {
            let mut next = coll.docs[pos].clone();
            if !update::apply(&mut next, &update) {
                continue;
            }
            if let Err(e) = check_unique(&coll.indexes, &coll.docs, &next, Some(pos)) {
                return Err(StoreError::Interrupted {
                    applied: outcome.modified,
                    attempted: outcome.matched,
                    source: Box::new(e),
                });
            }
            coll.docs[pos] = next;
            outcome.modified += 1;
        }
        Ok(outcome)
    }

    async fn delete(&self, ns: &Namespace, filter: Document, multi: bool) -> Result<DeleteOutcome, StoreError> {
        self.round_trip().await?;
        let mut collections = self.collections.write();
        let Some(coll) = collections.get_mut(ns) else {
            return Ok(DeleteOutcome::default());
        };
        let positions = matching_positions(&coll.docs, &filter, multi)?;
        for pos in positions.iter().rev() {
            coll.docs.remove(*pos);
        }
        Ok(DeleteOutcome { deleted: positions.len() as u64 })
    }

    async fn create_index(&self, ns: &Namespace, spec: IndexSpec) -> Result<String, StoreError> {
        self.round_trip().await?;
        let index = MemIndex::from_spec(&spec)?;
        let mut collections = self.collections.write();
        let coll = collections.entry(ns.clone()).or_default();
        if let Some(existing) = coll.indexes.iter().find(|i| i.name == index.name) {
            if existing.keys == index.keys && existing.unique == index.unique {
                return Ok(index.name);
            }
            return Err(StoreError::BadQuery(format!("index `{}` exists with different options", index.name)));
        }
        verify_existing(&index, &coll.docs)?;
        let name = index.name.clone();
        coll.indexes.push(index);
        Ok(name)
    }
}
