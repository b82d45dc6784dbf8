use crate::backend::StoreError;
use bson::{Bson, Document};

const MAX_UPDATE_FIELDS: usize = 128;

/// Checks that `update` is an operator document this backend understands.
pub fn validate(update: &Document) -> Result<(), StoreError> {
    if update.is_empty() {
        return Err(StoreError::BadQuery("update document is empty".into()));
    }
    for (op, arg) in update {
        match (op.as_str(), arg) {
            ("$set" | "$unset", Bson::Document(fields)) => {
                if fields.len() > MAX_UPDATE_FIELDS {
                    return Err(StoreError::BadQuery(format!("`{op}` touches too many fields")));
                }
                if fields.keys().any(|k| k == "_id" || k.starts_with("_id.")) {
                    return Err(StoreError::BadQuery("field `_id` is immutable".into()));
                }
            }
            ("$set" | "$unset", _) => {
                return Err(StoreError::BadQuery(format!("`{op}` expects a document")));
            }
            (other, _) => return Err(StoreError::BadQuery(format!("unsupported update operator `{other}`"))),
        }
    }
    Ok(())
}

/// Applies a validated update to `doc`, returning whether anything changed.
pub fn apply(doc: &mut Document, update: &Document) -> bool {
    let mut changed = false;
    for (op, arg) in update {
        let Bson::Document(fields) = arg else { continue };
        for (path, value) in fields {
            let touched = match op.as_str() {
                "$set" => set_path(doc, path, value.clone()),
                "$unset" => unset_path(doc, path),
                _ => false,
            };
            changed |= touched;
        }
    }
    changed
}

fn ensure_subdoc<'a>(root: &'a mut Document, key: &str) -> &'a mut Document {
    if !matches!(root.get(key), Some(Bson::Document(_))) {
        root.insert(key.to_string(), Bson::Document(Document::new()));
    }
    match root.get_mut(key) {
        Some(Bson::Document(d)) => d,
        _ => unreachable!("sub-document inserted above"),
    }
}

fn traverse_to_parent<'a>(root: &'a mut Document, path: &str) -> (&'a mut Document, String) {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    let mut last = String::new();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            last = seg.to_string();
            break;
        }
        cur = ensure_subdoc(cur, seg);
    }
    (cur, last)
}

pub(super) fn set_path(root: &mut Document, path: &str, value: Bson) -> bool {
    let (parent, last) = traverse_to_parent(root, path);
    let old = parent.insert(last, value.clone());
    old.as_ref() != Some(&value)
}

fn unset_path(root: &mut Document, path: &str) -> bool {
    let (parent, last) = traverse_to_parent(root, path);
    parent.remove(&last).is_some()
}
