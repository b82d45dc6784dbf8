//! The staged query-builder protocol every backend adapter implements.
//!
//! `model.find(filters)` → `.one()` / `.many()` → modifiers → `.exec(&ctx)`.
//! Each stage is its own type and consumes the previous one, so stages cannot
//! be reordered or revisited. Builders are single-use and not meant to be
//! shared between tasks.

use crate::context::Context;
use crate::errors::DbError;
use crate::params::{Params, SortParams};
use bson::Bson;
use std::borrow::Borrow;
use std::future::Future;

/// Result of a save.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SaveReport {
    pub inserted: u64,
    pub ids: Vec<Bson>,
}

/// Result of an update. Zero matches is a success with zero counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

/// Result of a delete. Zero matches is a success with zero count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: u64,
}

/// Terminal stage; the only call that performs backend I/O.
pub trait Exec: Sized + Send {
    type Output;

    fn exec(self, ctx: &Context) -> impl Future<Output = Result<Self::Output, DbError>> + Send;
}

/// A record type bound to a backend collection.
pub trait Model<T> {
    type Find: Find<T>;
    type Save: ModelSave<T>;
    type Update: ModelUpdate<T>;
    type Delete: ModelDelete<T>;

    fn find<I>(&self, filters: I) -> Self::Find
    where
        I: IntoIterator<Item = Params>;

    fn save(&self) -> Self::Save;

    fn update<I>(&self, filters: I) -> Self::Update
    where
        I: IntoIterator<Item = Params>;

    fn delete<I>(&self, filters: I) -> Self::Delete
    where
        I: IntoIterator<Item = Params>;
}

pub trait Find<T> {
    type One: FindOne<T>;
    type Many: FindMany<T>;

    fn one(self) -> Self::One;
    fn many(self) -> Self::Many;
}

pub trait FindOne<T>: Exec<Output = T> {
    #[must_use]
    fn sort<I>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = SortParams>;

    /// Restricts the returned fields to `fields` (storage keys).
    #[must_use]
    fn column<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>;
}

pub trait FindMany<T>: Exec<Output = Vec<T>> {
    #[must_use]
    fn sort<I>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = SortParams>;

    #[must_use]
    fn column<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>;

    /// Zero means no limit.
    #[must_use]
    fn limit(self, n: u64) -> Self;

    #[must_use]
    fn skip(self, n: u64) -> Self;
}

pub trait ModelSave<T> {
    type Exec: Exec<Output = SaveReport>;

    fn one<R: Borrow<T>>(self, record: R) -> Self::Exec;

    fn many<I>(self, records: I) -> Self::Exec
    where
        I: IntoIterator,
        I::Item: Borrow<T>;
}

pub trait ModelUpdate<T> {
    type Exec: Exec<Output = UpdateReport>;

    fn one<R: Borrow<T>>(self, record: R) -> Self::Exec;

    fn many<I>(self, records: I) -> Self::Exec
    where
        I: IntoIterator,
        I::Item: Borrow<T>;
}

pub trait ModelDelete<T> {
    type Exec: Exec<Output = DeleteReport>;

    fn one(self) -> Self::Exec;
    fn many(self) -> Self::Exec;
}
