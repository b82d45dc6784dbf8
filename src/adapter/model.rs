use super::schema::Schema;
use super::translate;
use crate::backend::{Backend, FindOptions, Namespace};
use crate::context::Context;
use crate::database::{
    DeleteReport, Exec, Find, FindMany, FindOne, Model, ModelDelete, ModelSave, ModelUpdate, SaveReport,
    UpdateReport,
};
use crate::errors::{DbError, OpKind};
use crate::params::{Params, SortParams};
use crate::parser::{self, Record};
use crate::qlog;
use crate::utils::devlog::QueryRecord;
use bson::{Document, doc};
use serde::de::DeserializeOwned;
use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

type Deferred<V> = Result<V, DbError>;

struct Binding {
    backend: Arc<dyn Backend>,
    ns: Namespace,
    schema: Schema,
}

impl Binding {
    fn store_err(&self, op: OpKind) -> impl Fn(crate::backend::StoreError) -> DbError + '_ {
        move |e| DbError::from_store(op, &self.ns.collection, e)
    }

    /// Runs one backend call under `ctx` and emits its query record.
    async fn observe<O, F>(&self, op: OpKind, ctx: &Context, count: fn(&O) -> u64, fut: F) -> Result<O, DbError>
    where
        F: Future<Output = Result<O, DbError>>,
    {
        let started = Instant::now();
        let result = ctx.run(fut).await;
        let record = QueryRecord::new(op.as_str(), &self.ns.collection, started.elapsed());
        match &result {
            Ok(out) => qlog!(record.count(count(out))),
            Err(e) => {
                log::debug!("{op} on {} failed: {e}", self.ns);
                qlog!(record.failed(e));
            }
        }
        result
    }
}

/// A record type bound to one collection. Cheap to clone; holds no query state.
pub struct DocumentModel<T> {
    binding: Arc<Binding>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentModel<T> {
    fn clone(&self) -> Self {
        Self { binding: Arc::clone(&self.binding), _record: PhantomData }
    }
}

impl<T> fmt::Debug for DocumentModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentModel")
            .field("namespace", &self.binding.ns.to_string())
            .field("backend", &self.binding.backend.kind())
            .finish()
    }
}

impl<T: Record> DocumentModel<T> {
    pub(crate) fn bind(backend: Arc<dyn Backend>, ns: Namespace) -> Result<Self, DbError> {
        let schema = Schema::new(T::FIELDS)?;
        Ok(Self { binding: Arc::new(Binding { backend, ns, schema }), _record: PhantomData })
    }

    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.binding.ns
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.binding.ns.collection
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.binding.schema
    }

    /// Creates backend indexes for fields marked `index` or `unique`.
    /// Returns the index names in declaration order.
    ///
    /// # Errors
    /// Backend failures, cancellation or deadline expiry.
    pub async fn ensure_indexes(&self, ctx: &Context) -> Result<Vec<String>, DbError> {
        let b = &self.binding;
        let specs = b.schema.index_specs();
        b.observe(OpKind::CreateIndex, ctx, |names: &Vec<String>| names.len() as u64, async {
            let mut names = Vec::with_capacity(specs.len());
            for spec in specs {
                names.push(b.backend.create_index(&b.ns, spec).await.map_err(b.store_err(OpKind::CreateIndex))?);
            }
            Ok(names)
        })
        .await
    }

    fn filter_document<I: IntoIterator<Item = Params>>(&self, filters: I) -> Deferred<Document> {
        let doc = translate::params_to_document(filters)?;
        self.binding.schema.check_keys(&doc)?;
        Ok(doc)
    }

    fn sort_document<I: IntoIterator<Item = SortParams>>(&self, keys: I) -> Deferred<Document> {
        let doc = translate::sort_params_to_document(keys)?;
        self.binding.schema.check_keys(&doc)?;
        Ok(doc)
    }

    fn projection_document<I, S>(&self, fields: I) -> Deferred<Document>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let doc = translate::projection_document(fields)?;
        self.binding.schema.check_keys(&doc)?;
        Ok(doc)
    }
}

impl<T: Record + DeserializeOwned> DocumentModel<T> {
    fn decode(&self, stored: Document) -> Result<T, DbError> {
        Ok(bson::deserialize_from_document(self.binding.schema.to_field_names(stored))?)
    }
}

fn encode<T: Record>(record: &T) -> Deferred<Document> {
    translate::parsed_to_document(&parser::parse(record)?)
}

impl<T> Model<T> for DocumentModel<T>
where
    T: Record + DeserializeOwned + Send + 'static,
{
    type Find = FindQuery<T>;
    type Save = SaveQuery<T>;
    type Update = UpdateQuery<T>;
    type Delete = DeleteQuery<T>;

    fn find<I>(&self, filters: I) -> FindQuery<T>
    where
        I: IntoIterator<Item = Params>,
    {
        FindQuery { model: self.clone(), filter: self.filter_document(filters) }
    }

    fn save(&self) -> SaveQuery<T> {
        SaveQuery { model: self.clone() }
    }

    fn update<I>(&self, filters: I) -> UpdateQuery<T>
    where
        I: IntoIterator<Item = Params>,
    {
        UpdateQuery { model: self.clone(), filter: self.filter_document(filters) }
    }

    fn delete<I>(&self, filters: I) -> DeleteQuery<T>
    where
        I: IntoIterator<Item = Params>,
    {
        DeleteQuery { model: self.clone(), filter: self.filter_document(filters) }
    }
}

// ---- find ----

pub struct FindQuery<T> {
    model: DocumentModel<T>,
    filter: Deferred<Document>,
}

impl<T> Find<T> for FindQuery<T>
where
    T: Record + DeserializeOwned + Send + 'static,
{
    type One = FindOneQuery<T>;
    type Many = FindManyQuery<T>;

    fn one(self) -> FindOneQuery<T> {
        FindOneQuery { model: self.model, filter: self.filter, sort: None, projection: None }
    }

    fn many(self) -> FindManyQuery<T> {
        FindManyQuery { model: self.model, filter: self.filter, sort: None, projection: None, limit: 0, skip: 0 }
    }
}

pub struct FindOneQuery<T> {
    model: DocumentModel<T>,
    filter: Deferred<Document>,
    sort: Option<Deferred<Document>>,
    projection: Option<Deferred<Document>>,
}

impl<T> FindOne<T> for FindOneQuery<T>
where
    T: Record + DeserializeOwned + Send + 'static,
{
    fn sort<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = SortParams>,
    {
        self.sort = Some(self.model.sort_document(keys));
        self
    }

    fn column<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(self.model.projection_document(fields));
        self
    }
}

impl<T> Exec for FindOneQuery<T>
where
    T: Record + DeserializeOwned + Send + 'static,
{
    type Output = T;

    async fn exec(self, ctx: &Context) -> Result<T, DbError> {
        let Self { model, filter, sort, projection } = self;
        let b = &model.binding;
        b.observe(OpKind::FindOne, ctx, |_| 1, async {
            let options = FindOptions {
                sort: sort.transpose()?,
                projection: projection.transpose()?,
                skip: 0,
                limit: Some(1),
            };
            let found = b.backend.find(&b.ns, filter?, options).await.map_err(b.store_err(OpKind::FindOne))?;
            let stored = found
                .into_iter()
                .next()
                .ok_or_else(|| DbError::NotFound { collection: b.ns.collection.clone() })?;
            model.decode(stored)
        })
        .await
    }
}

pub struct FindManyQuery<T> {
    model: DocumentModel<T>,
    filter: Deferred<Document>,
    sort: Option<Deferred<Document>>,
    projection: Option<Deferred<Document>>,
    limit: u64,
    skip: u64,
}

impl<T> FindMany<T> for FindManyQuery<T>
where
    T: Record + DeserializeOwned + Send + 'static,
{
    fn sort<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = SortParams>,
    {
        self.sort = Some(self.model.sort_document(keys));
        self
    }

    fn column<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(self.model.projection_document(fields));
        self
    }

    fn limit(mut self, n: u64) -> Self {
        self.limit = n;
        self
    }

    fn skip(mut self, n: u64) -> Self {
        self.skip = n;
        self
    }
}

impl<T> Exec for FindManyQuery<T>
where
    T: Record + DeserializeOwned + Send + 'static,
{
    type Output = Vec<T>;

    async fn exec(self, ctx: &Context) -> Result<Vec<T>, DbError> {
        let Self { model, filter, sort, projection, limit, skip } = self;
        let b = &model.binding;
        b.observe(OpKind::FindMany, ctx, |out: &Vec<T>| out.len() as u64, async {
            let options = FindOptions {
                sort: sort.transpose()?,
                projection: projection.transpose()?,
                skip,
                limit: (limit > 0).then_some(limit),
            };
            let found = b.backend.find(&b.ns, filter?, options).await.map_err(b.store_err(OpKind::FindMany))?;
            found.into_iter().map(|stored| model.decode(stored)).collect()
        })
        .await
    }
}

// ---- save ----

pub struct SaveQuery<T> {
    model: DocumentModel<T>,
}

impl<T> ModelSave<T> for SaveQuery<T>
where
    T: Record + Send + 'static,
{
    type Exec = SaveExec<T>;

    fn one<R: Borrow<T>>(self, record: R) -> SaveExec<T> {
        SaveExec { model: self.model, op: OpKind::SaveOne, docs: encode::<T>(record.borrow()).map(|d| vec![d]) }
    }

    fn many<I>(self, records: I) -> SaveExec<T>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let docs = records.into_iter().map(|r| encode::<T>(r.borrow())).collect();
        SaveExec { model: self.model, op: OpKind::SaveMany, docs }
    }
}

pub struct SaveExec<T> {
    model: DocumentModel<T>,
    op: OpKind,
    docs: Deferred<Vec<Document>>,
}

impl<T> Exec for SaveExec<T>
where
    T: Record + Send + 'static,
{
    type Output = SaveReport;

    /// An empty batch succeeds without contacting the backend.
    async fn exec(self, ctx: &Context) -> Result<SaveReport, DbError> {
        let Self { model, op, docs } = self;
        let b = &model.binding;
        b.observe(op, ctx, |r: &SaveReport| r.inserted, async {
            let docs = docs?;
            if docs.is_empty() {
                return Ok(SaveReport::default());
            }
            let out = b.backend.insert(&b.ns, docs).await.map_err(b.store_err(op))?;
            Ok(SaveReport { inserted: out.ids.len() as u64, ids: out.ids })
        })
        .await
    }
}

// ---- update ----

pub struct UpdateQuery<T> {
    model: DocumentModel<T>,
    filter: Deferred<Document>,
}

/// Fields to `$set` from one record; `_id` is never rewritten.
fn set_fields<T: Record>(record: &T) -> Deferred<Document> {
    let mut doc = encode(record)?;
    doc.remove("_id");
    Ok(doc)
}

impl<T> ModelUpdate<T> for UpdateQuery<T>
where
    T: Record + Send + 'static,
{
    type Exec = UpdateExec<T>;

    fn one<R: Borrow<T>>(self, record: R) -> UpdateExec<T> {
        UpdateExec {
            model: self.model,
            op: OpKind::UpdateOne,
            filter: self.filter,
            set: set_fields::<T>(record.borrow()).map(Some),
            multi: false,
        }
    }

    /// Later records override earlier ones on shared keys.
    fn many<I>(self, records: I) -> UpdateExec<T>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let set = records.into_iter().try_fold(None::<Document>, |acc, r| {
            let mut merged = acc.unwrap_or_default();
            for (k, v) in set_fields::<T>(r.borrow())? {
                merged.insert(k, v);
            }
            Ok::<_, DbError>(Some(merged))
        });
        UpdateExec { model: self.model, op: OpKind::UpdateMany, filter: self.filter, set, multi: true }
    }
}

pub struct UpdateExec<T> {
    model: DocumentModel<T>,
    op: OpKind,
    filter: Deferred<Document>,
    set: Deferred<Option<Document>>,
    multi: bool,
}

impl<T> Exec for UpdateExec<T>
where
    T: Record + Send + 'static,
{
    type Output = UpdateReport;

    async fn exec(self, ctx: &Context) -> Result<UpdateReport, DbError> {
        let Self { model, op, filter, set, multi } = self;
        let b = &model.binding;
        b.observe(op, ctx, |r: &UpdateReport| r.modified, async {
            let filter = filter?;
            let Some(set) = set? else {
                return Ok(UpdateReport::default());
            };
            let out = b.backend.update(&b.ns, filter, doc! { "$set": set }, multi).await.map_err(b.store_err(op))?;
            Ok(UpdateReport { matched: out.matched, modified: out.modified })
        })
        .await
    }
}

// ---- delete ----

pub struct DeleteQuery<T> {
    model: DocumentModel<T>,
    filter: Deferred<Document>,
}

impl<T> ModelDelete<T> for DeleteQuery<T>
where
    T: Record + Send + 'static,
{
    type Exec = DeleteExec<T>;

    fn one(self) -> DeleteExec<T> {
        DeleteExec { model: self.model, op: OpKind::DeleteOne, filter: self.filter, multi: false }
    }

    fn many(self) -> DeleteExec<T> {
        DeleteExec { model: self.model, op: OpKind::DeleteMany, filter: self.filter, multi: true }
    }
}

pub struct DeleteExec<T> {
    model: DocumentModel<T>,
    op: OpKind,
    filter: Deferred<Document>,
    multi: bool,
}

impl<T> Exec for DeleteExec<T>
where
    T: Record + Send + 'static,
{
    type Output = DeleteReport;

    async fn exec(self, ctx: &Context) -> Result<DeleteReport, DbError> {
        let Self { model, op, filter, multi } = self;
        let b = &model.binding;
        b.observe(op, ctx, |r: &DeleteReport| r.deleted, async {
            let out = b.backend.delete(&b.ns, filter?, multi).await.map_err(b.store_err(op))?;
            Ok(DeleteReport { deleted: out.deleted })
        })
        .await
    }
}
