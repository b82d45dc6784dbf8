//! Backend-agnostic values to native BSON documents.
//!
//! Every function here is pure. Key checks are syntactic only; whether a key
//! names a field of the record type is the schema's concern.

use crate::errors::DbError;
use crate::params::{Params, SortOrder, SortParams};
use crate::parser::{FieldValue, ParsedField};
use bson::{Bson, Document};

/// Rejects keys a document store would misread: empty, operator-like,
/// NUL-bearing, or with an empty dotted segment.
pub fn check_key(key: &str) -> Result<(), DbError> {
    if key.is_empty() {
        return Err(DbError::Validation("key must not be empty".into()));
    }
    if key.starts_with('$') {
        return Err(DbError::Validation(format!("key `{key}` must not start with `$`")));
    }
    if key.contains('\0') {
        return Err(DbError::Validation(format!("key {key:?} contains NUL")));
    }
    if key.split('.').any(str::is_empty) {
        return Err(DbError::Validation(format!("key `{key}` has an empty path segment")));
    }
    Ok(())
}

fn insert_unique(doc: &mut Document, what: &str, key: String, value: Bson) -> Result<(), DbError> {
    if doc.contains_key(&key) {
        return Err(DbError::Validation(format!("duplicate {what} key `{key}`")));
    }
    doc.insert(key, value);
    Ok(())
}

/// One `key: value` entry per condition, in input order.
pub fn params_to_document<I>(params: I) -> Result<Document, DbError>
where
    I: IntoIterator<Item = Params>,
{
    let mut doc = Document::new();
    for p in params {
        let (key, value) = p.into_parts();
        check_key(&key)?;
        insert_unique(&mut doc, "filter", key, value)?;
    }
    Ok(doc)
}

#[must_use]
pub const fn sort_order_value(order: SortOrder) -> Bson {
    match order {
        SortOrder::Asc => Bson::Int32(1),
        SortOrder::Desc => Bson::Int32(-1),
    }
}

/// `key: 1` for ascending, `key: -1` for descending, in input order.
pub fn sort_params_to_document<I>(sorts: I) -> Result<Document, DbError>
where
    I: IntoIterator<Item = SortParams>,
{
    let mut doc = Document::new();
    for s in sorts {
        check_key(s.key())?;
        insert_unique(&mut doc, "sort", s.key().to_string(), sort_order_value(s.order()))?;
    }
    Ok(doc)
}

/// Inclusion projection `{key: 1, ...}`.
pub fn projection_document<I, S>(fields: I) -> Result<Document, DbError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut doc = Document::new();
    for f in fields {
        let key = f.into();
        check_key(&key)?;
        insert_unique(&mut doc, "projection", key, Bson::Int32(1))?;
    }
    Ok(doc)
}

/// Storable value for one parsed field.
pub fn field_to_bson(field: &ParsedField) -> Result<Bson, DbError> {
    match &field.value {
        FieldValue::Int(i) => Ok(Bson::Int64(*i)),
        FieldValue::UInt(u) => i64::try_from(*u).map(Bson::Int64).map_err(|_| {
            DbError::Validation(format!("field `{}`: {u} does not fit a signed 64-bit integer", field.name))
        }),
        FieldValue::Float(f) => Ok(Bson::Double(*f)),
        FieldValue::Bool(b) => Ok(Bson::Boolean(*b)),
        FieldValue::Str(s) => Ok(Bson::String(s.clone())),
        FieldValue::Embedded(nested) => parsed_to_document(nested).map(Bson::Document),
        FieldValue::Other(_) => Err(DbError::UnsupportedType {
            field: field.name.to_string(),
            type_name: field.type_name.to_string(),
        }),
    }
}

/// Native document for a parsed record, keyed by storage key (or field name when untagged).
pub fn parsed_to_document(fields: &[ParsedField]) -> Result<Document, DbError> {
    let mut doc = Document::new();
    for field in fields {
        let key = field.key();
        check_key(key)?;
        let value = field_to_bson(field)?;
        insert_unique(&mut doc, "field", key.to_string(), value)?;
    }
    Ok(doc)
}
