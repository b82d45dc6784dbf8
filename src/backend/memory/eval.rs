use super::update::set_path;
use crate::backend::StoreError;
use bson::{Bson, Document};
use std::cmp::Ordering;

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;

/// Evaluates a native filter document against `doc`.
pub fn matches(doc: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, cond) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(key, cond)? {
                    if !matches(doc, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for sub in sub_filters(key, cond)? {
                    if matches(doc, sub)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            k if k.starts_with('$') => {
                return Err(StoreError::BadQuery(format!("unknown top-level operator `{k}`")));
            }
            path => match_field(get_path(doc, path), cond)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_filters<'a>(op: &str, cond: &'a Bson) -> Result<Vec<&'a Document>, StoreError> {
    let Bson::Array(items) = cond else {
        return Err(StoreError::BadQuery(format!("`{op}` expects an array")));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d),
            _ => Err(StoreError::BadQuery(format!("`{op}` expects an array of documents"))),
        })
        .collect()
}

fn is_operator_doc(cond: &Bson) -> Option<&Document> {
    match cond {
        Bson::Document(d) if !d.is_empty() && d.keys().all(|k| k.starts_with('$')) => Some(d),
        _ => None,
    }
}

fn match_field(value: Option<&Bson>, cond: &Bson) -> Result<bool, StoreError> {
    let Some(ops) = is_operator_doc(cond) else {
        return Ok(value.is_some_and(|v| equals_or_contains(v, cond)));
    };

    for (op, arg) in ops {
        let ok = match op.as_str() {
            "$eq" => value.is_some_and(|v| equals_or_contains(v, arg)),
            "$ne" => !value.is_some_and(|v| equals_or_contains(v, arg)),
            "$gt" => ordered(value, arg, |o| o == Ordering::Greater),
            "$gte" => ordered(value, arg, |o| o != Ordering::Less),
            "$lt" => ordered(value, arg, |o| o == Ordering::Less),
            "$lte" => ordered(value, arg, |o| o != Ordering::Greater),
            "$in" => {
                let set = array_arg(op, arg)?;
                value.is_some_and(|v| in_set(v, set))
            }
            "$nin" => {
                let set = array_arg(op, arg)?;
                !value.is_some_and(|v| in_set(v, set))
            }
            "$exists" => match arg {
                Bson::Boolean(want) => value.is_some() == *want,
                _ => return Err(StoreError::BadQuery("`$exists` expects a boolean".into())),
            },
            other => return Err(StoreError::BadQuery(format!("unknown operator `{other}`"))),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn ordered(value: Option<&Bson>, arg: &Bson, pred: impl Fn(Ordering) -> bool) -> bool {
    value.is_some_and(|v| comparable(v, arg) && pred(compare_bson(v, arg)))
}

fn array_arg<'a>(op: &str, arg: &'a Bson) -> Result<&'a [Bson], StoreError> {
    match arg {
        Bson::Array(set) => Ok(set),
        _ => Err(StoreError::BadQuery(format!("`{op}` expects an array"))),
    }
}

fn in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().take(MAX_IN_SET).any(|x| equals_or_contains(v, x))
}

/// Equality with numeric widening; an array field also matches any of its elements.
pub fn equals_or_contains(field: &Bson, want: &Bson) -> bool {
    if values_equal(field, want) {
        return true;
    }
    match (field, want) {
        (Bson::Array(items), w) if !matches!(w, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(item, w))
        }
        _ => false,
    }
}

pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return compare_bson(a, b) == Ordering::Equal;
    }
    a == b
}

/// Comparisons only apply within one type class, as in the usual document-store semantics.
fn comparable(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b)) || type_rank(a) == type_rank(b)
}

pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut segs = path.split('.');
    let mut cur = doc.get(segs.next()?)?;
    for (depth, seg) in segs.enumerate() {
        if depth + 1 >= MAX_PATH_DEPTH {
            return None;
        }
        match cur {
            Bson::Document(d) => cur = d.get(seg)?,
            _ => return None,
        }
    }
    Some(cur)
}

/// Parses a native sort document into `(path, ascending)` pairs.
pub fn parse_sort(sort: &Document) -> Result<Vec<(String, bool)>, StoreError> {
    if sort.len() > MAX_SORT_FIELDS {
        log::warn!("sort spec too long: {}", sort.len());
    }
    sort.iter()
        .take(MAX_SORT_FIELDS)
        .map(|(k, v)| {
            let dir = match v {
                Bson::Int32(i) => i64::from(*i),
                Bson::Int64(i) => *i,
                #[allow(clippy::cast_possible_truncation)]
                Bson::Double(f) => *f as i64,
                _ => 0,
            };
            match dir {
                1 => Ok((k.clone(), true)),
                -1 => Ok((k.clone(), false)),
                _ => Err(StoreError::BadQuery(format!("invalid sort direction for `{k}`: {v}"))),
            }
        })
        .collect()
}

pub fn compare_docs(a: &Document, b: &Document, sort: &[(String, bool)]) -> Ordering {
    for (path, asc) in sort {
        let ord = match (get_path(a, path), get_path(b, path)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if *asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

/// Applies an inclusion or exclusion projection. `_id` is kept unless excluded.
pub fn project(doc: &Document, projection: &Document) -> Result<Document, StoreError> {
    let mut include_id = true;
    let mut mode: Option<bool> = None;
    for (k, v) in projection {
        let on = match v {
            Bson::Int32(i) => *i != 0,
            Bson::Int64(i) => *i != 0,
            Bson::Double(f) => *f != 0.0,
            Bson::Boolean(b) => *b,
            _ => return Err(StoreError::BadQuery(format!("invalid projection value for `{k}`"))),
        };
        if k == "_id" {
            include_id = on;
            continue;
        }
        match mode {
            Some(m) if m != on => {
                return Err(StoreError::BadQuery("cannot mix inclusion and exclusion in projection".into()));
            }
            _ => mode = Some(on),
        }
    }

    let keys = projection.iter().map(|(k, _)| k).filter(|k| k.as_str() != "_id");
    let out = if mode == Some(true) {
        let mut out = Document::new();
        if include_id && let Some(id) = doc.get("_id") {
            out.insert("_id", id.clone());
        }
        for k in keys {
            if let Some(v) = get_path(doc, k) {
                set_path(&mut out, k, v.clone());
            }
        }
        out
    } else {
        let mut out = doc.clone();
        if !include_id {
            out.remove("_id");
        }
        for k in keys {
            remove_path(&mut out, k);
        }
        out
    };
    Ok(out)
}

/// Removes `path` without creating intermediate documents.
fn remove_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if let (Bson::Int64(x), Bson::Int64(y)) = (a, b) {
        return x.cmp(y);
    }
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

const fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::Symbol(_) | Bson::String(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) => 12,
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => 13,
        Bson::MaxKey => 255,
    }
}
