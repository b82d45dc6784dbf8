use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use siddon::Record;
use siddon::backend::{
    Backend, DeleteOutcome, FindOptions, IndexSpec, InsertOutcome, MemoryBackend, Namespace, StoreError, UpdateOutcome,
};
use siddon::bson::Document;
use siddon::{Client, DocumentModel, register_model};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Record, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    #[db("name")]
    #[attr("required,unique")]
    pub name: String,
    #[db("age")]
    #[attr("index")]
    pub age: i64,
    #[db("rank")]
    pub rank: u32,
}

impl Person {
    pub fn new(name: &str, age: i64, rank: u32) -> Self {
        Self { name: name.to_string(), age, rank }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Record, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[db("city")]
    pub city: String,
    #[db("zip")]
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Default, Record, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    #[db("_id")]
    pub id: String,
    #[db("full_name")]
    pub name: String,
    #[db("addr")]
    #[attr("embed")]
    pub address: Address,
    pub vip: bool,
}

/// Delegates to a memory store and counts calls per kind.
#[derive(Debug, Default)]
pub struct CountingBackend {
    pub inner: MemoryBackend,
    pub finds: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingBackend {
    pub fn writes(&self) -> usize {
        self.inserts.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for CountingBackend {
    fn kind(&self) -> &'static str {
        "counting"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn find(&self, ns: &Namespace, filter: Document, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(ns, filter, options).await
    }

    async fn insert(&self, ns: &Namespace, docs: Vec<Document>) -> Result<InsertOutcome, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(ns, docs).await
    }

    async fn update(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
        multi: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(ns, filter, update, multi).await
    }

    async fn delete(&self, ns: &Namespace, filter: Document, multi: bool) -> Result<DeleteOutcome, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(ns, filter, multi).await
    }

    async fn create_index(&self, ns: &Namespace, index: IndexSpec) -> Result<String, StoreError> {
        self.inner.create_index(ns, index).await
    }
}

pub async fn client_on(backend: Arc<dyn Backend>) -> Client {
    Client::with_backend(backend, Duration::from_secs(1)).await.unwrap()
}

pub async fn memory_client() -> (Client, Arc<MemoryBackend>) {
    let mem = Arc::new(MemoryBackend::new());
    (client_on(mem.clone()).await, mem)
}

pub async fn people() -> (DocumentModel<Person>, Arc<MemoryBackend>) {
    let (client, mem) = memory_client().await;
    (register_model::<Person>(&client.database("test"), "people").unwrap(), mem)
}
