//! Registration-time view of a record type's field table.

use super::translate::check_key;
use crate::backend::IndexSpec;
use crate::errors::DbError;
use crate::parser::FieldDef;
use bson::{Bson, Document};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [FieldDef],
}

impl Schema {
    /// Checks that every document key is well formed and unique, recursively.
    ///
    /// # Errors
    /// `DbError::Validation` naming the offending key.
    pub fn new(fields: &'static [FieldDef]) -> Result<Self, DbError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for def in fields {
            check_key(def.key())?;
            if def.key().contains('.') {
                return Err(DbError::Validation(format!("field `{}`: storage key `{}` must not contain `.`", def.name, def.key())));
            }
            if !seen.insert(def.key()) {
                return Err(DbError::Validation(format!("duplicate storage key `{}` (field `{}`)", def.key(), def.name)));
            }
            if let Some(nested) = def.embedded {
                Self::new(nested)?;
            }
        }
        Ok(Self { fields })
    }

    #[must_use]
    pub const fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    fn lookup(&self, key: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|d| d.key() == key)
    }

    /// Accepts well-formed paths whose first segment is a stored key or `_id`.
    pub fn check_path(&self, path: &str) -> Result<(), DbError> {
        check_key(path)?;
        let head = path.split('.').next().unwrap_or(path);
        if head == "_id" || self.lookup(head).is_some() {
            Ok(())
        } else {
            Err(DbError::Validation(format!("unknown key `{path}`")))
        }
    }

    pub fn check_keys(&self, doc: &Document) -> Result<(), DbError> {
        doc.keys().try_for_each(|k| self.check_path(k))
    }

    /// Renames stored keys back to field names so serde can decode the document.
    /// Unknown keys are passed through unchanged.
    #[must_use]
    pub fn to_field_names(&self, doc: Document) -> Document {
        let mut out = Document::new();
        for (key, value) in doc {
            match self.lookup(&key) {
                Some(def) => {
                    let value = match (def.embedded, value) {
                        (Some(nested), Bson::Document(inner)) => Bson::Document(Self { fields: nested }.to_field_names(inner)),
                        (_, v) => v,
                    };
                    out.insert(def.name, value);
                }
                None => {
                    out.insert(key, value);
                }
            }
        }
        out
    }

    /// Index requests for fields marked `index` or `unique`, embedded fields by dotted path.
    #[must_use]
    pub fn index_specs(&self) -> Vec<IndexSpec> {
        let mut out = Vec::new();
        self.collect_indexes("", &mut out);
        out
    }

    fn collect_indexes(&self, prefix: &str, out: &mut Vec<IndexSpec>) {
        for def in self.fields {
            let path = if prefix.is_empty() { def.key().to_string() } else { format!("{prefix}.{}", def.key()) };
            let unique = def.has_attr("unique");
            if unique || def.has_attr("index") {
                let mut keys = Document::new();
                keys.insert(path.clone(), 1);
                out.push(IndexSpec { name: format!("{path}_1"), keys, unique });
            }
            if let Some(nested) = def.embedded {
                Self { fields: nested }.collect_indexes(&path, out);
            }
        }
    }
}
