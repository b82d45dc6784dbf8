use super::eval::get_path;
use crate::backend::{IndexSpec, StoreError};
use bson::{Bson, Document};
use ordered_float::OrderedFloat;
use std::fmt;

/// Comparable form of one indexed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKeyKind {
    Null,
    Bool(bool),
    I64(i64),
    F64(OrderedFloat<f64>),
    Str(String),
    ObjectId([u8; 12]),
    Other(String),
}

impl fmt::Display for IndexKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKeyKind::Null => f.write_str("null"),
            IndexKeyKind::Bool(b) => write!(f, "{b}"),
            IndexKeyKind::I64(i) => write!(f, "{i}"),
            IndexKeyKind::F64(x) => write!(f, "{}", x.0),
            IndexKeyKind::Str(s) => write!(f, "{s:?}"),
            IndexKeyKind::ObjectId(b) => write!(f, "{}", bson::oid::ObjectId::from_bytes(*b)),
            IndexKeyKind::Other(s) => f.write_str(s),
        }
    }
}

/// Missing and null collapse to the same key, as in most document stores.
#[must_use]
pub fn key_from_bson(v: Option<&Bson>) -> IndexKeyKind {
    match v {
        None | Some(Bson::Null | Bson::Undefined) => IndexKeyKind::Null,
        Some(Bson::String(s)) => IndexKeyKind::Str(s.clone()),
        Some(Bson::Int32(i)) => IndexKeyKind::I64(i64::from(*i)),
        Some(Bson::Int64(i)) => IndexKeyKind::I64(*i),
        #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
        Some(Bson::Double(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => IndexKeyKind::I64(*f as i64),
        Some(Bson::Double(f)) => IndexKeyKind::F64(OrderedFloat(*f)),
        Some(Bson::Boolean(b)) => IndexKeyKind::Bool(*b),
        Some(Bson::ObjectId(oid)) => IndexKeyKind::ObjectId(oid.bytes()),
        Some(other) => IndexKeyKind::Other(other.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct MemIndex {
    pub name: String,
    pub keys: Vec<String>,
    pub unique: bool,
}

impl MemIndex {
    pub fn primary() -> Self {
        Self { name: "_id_".into(), keys: vec!["_id".into()], unique: true }
    }

    pub fn from_spec(spec: &IndexSpec) -> Result<Self, StoreError> {
        if spec.keys.is_empty() {
            return Err(StoreError::BadQuery(format!("index `{}` has no keys", spec.name)));
        }
        let mut keys = Vec::with_capacity(spec.keys.len());
        for (k, dir) in &spec.keys {
            match dir {
                Bson::Int32(1 | -1) | Bson::Int64(1 | -1) => keys.push(k.clone()),
                other => {
                    return Err(StoreError::BadQuery(format!(
                        "index `{}`: direction for `{k}` must be 1 or -1, got {other}",
                        spec.name
                    )));
                }
            }
        }
        Ok(Self { name: spec.name.clone(), keys, unique: spec.unique })
    }

    pub fn key_of(&self, doc: &Document) -> Vec<IndexKeyKind> {
        self.keys.iter().map(|k| key_from_bson(get_path(doc, k))).collect()
    }

    fn describe(&self, key: &[IndexKeyKind]) -> String {
        let parts: Vec<String> =
            self.keys.iter().zip(key).map(|(name, value)| format!("{name}: {value}")).collect();
        format!("{{ {} }}", parts.join(", "))
    }
}

/// Rejects `candidate` if it collides with any document in `docs` on a unique
/// index. `skip` excludes the slot being replaced during an update.
pub fn check_unique(
    indexes: &[MemIndex],
    docs: &[Document],
    candidate: &Document,
    skip: Option<usize>,
) -> Result<(), StoreError> {
    for index in indexes.iter().filter(|i| i.unique) {
        let key = index.key_of(candidate);
        let clash = docs
            .iter()
            .enumerate()
            .filter(|(pos, _)| Some(*pos) != skip)
            .any(|(_, existing)| index.key_of(existing) == key);
        if clash {
            return Err(StoreError::DuplicateKey { index: index.name.clone(), key: index.describe(&key) });
        }
    }
    Ok(())
}

/// Verifies that a new unique index holds over the existing documents.
pub fn verify_existing(index: &MemIndex, docs: &[Document]) -> Result<(), StoreError> {
    if !index.unique {
        return Ok(());
    }
    let mut seen = std::collections::HashSet::with_capacity(docs.len());
    for doc in docs {
        let key = index.key_of(doc);
        if !seen.insert(key.clone()) {
            return Err(StoreError::DuplicateKey { index: index.name.clone(), key: index.describe(&key) });
        }
    }
    Ok(())
}
