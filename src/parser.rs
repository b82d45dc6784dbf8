//! Record field metadata.
//!
//! A record type describes its fields once, at compile time, through
//! [`Record::FIELDS`] (normally generated by `#[derive(Record)]`). [`parse`]
//! pairs that table with the current values of one record instance.
//!
//! ```ignore
//! #[derive(Record)]
//! struct User {
//!     #[db("id")]
//!     #[attr("required,mongoid")]
//!     id: String,
//!     #[db("name")]
//!     #[attr("min=2,max=20")]
//!     name: String,
//!     #[db("age")]
//!     #[attr("required")]
//!     age: i64,
//!     #[db("address")]
//!     #[attr("embed")]
//!     address: Address,
//! }
//! ```

use crate::errors::DbError;
use bson::Bson;
use std::fmt;

/// Static description of one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub type_name: &'static str,
    /// Value of the `db` tag, empty when the tag is absent.
    pub storage_key: &'static str,
    /// Markers from the `attr` tag, empty when the tag is absent.
    pub attrs: &'static [&'static str],
    /// Field table of an `embed` field's record type.
    pub embedded: Option<&'static [FieldDef]>,
}

impl FieldDef {
    /// Key used in stored documents: the storage key, or the field name when untagged.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        if self.storage_key.is_empty() { self.name } else { self.storage_key }
    }

    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        self.attrs.iter().map(|a| Attribute::parse(a)).collect()
    }

    #[must_use]
    pub fn has_attr(&self, marker: &str) -> bool {
        self.attrs.iter().any(|a| *a == marker)
    }
}

/// Current value of a field, classified by primitive kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Nested fields of an `embed` field; not flattened into the parent.
    Embedded(Vec<ParsedField>),
    /// Any other kind; carries the serde rendering when one exists.
    Other(Option<Bson>),
}

impl FieldValue {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Embedded(_) => "embedded",
            Self::Other(_) => "other",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// Metadata and value of one field of a parsed record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedField {
    pub name: &'static str,
    pub type_name: &'static str,
    pub storage_key: &'static str,
    pub attrs: &'static [&'static str],
    pub value: FieldValue,
}

impl ParsedField {
    #[must_use]
    pub const fn key(&self) -> &'static str {
        if self.storage_key.is_empty() { self.name } else { self.storage_key }
    }

    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        self.attrs.iter().map(|a| Attribute::parse(a)).collect()
    }
}

/// A record type with a compile-time field table.
pub trait Record {
    const FIELDS: &'static [FieldDef];

    /// Values in the same order as [`Record::FIELDS`].
    fn field_values(&self) -> Result<Vec<FieldValue>, DbError>;
}

/// Extracts ordered field metadata from a record.
///
/// # Errors
/// Returns `DbError::TypeError` when the record's values do not line up with its
/// field table (only possible for hand-written `Record` impls).
pub fn parse<R: Record + ?Sized>(record: &R) -> Result<Vec<ParsedField>, DbError> {
    let values = record.field_values()?;
    if values.len() != R::FIELDS.len() {
        return Err(DbError::TypeError {
            expected: "a record whose values match its declared fields",
            found: format!("{} values for {} fields", values.len(), R::FIELDS.len()),
        });
    }

    Ok(R::FIELDS
        .iter()
        .zip(values)
        .map(|(def, value)| ParsedField {
            name: def.name,
            type_name: def.type_name,
            storage_key: def.storage_key,
            attrs: def.attrs,
            value,
        })
        .collect())
}

/// Typed view of an `attr` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Required,
    Min(i64),
    Max(i64),
    Email,
    MongoId,
    Tz,
    Embed,
    Unique,
    Index,
    Other(String),
}

impl Attribute {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some((name, arg)) = raw.split_once('=') {
            let bound = arg.trim().parse::<i64>();
            return match (name.trim(), bound) {
                ("min", Ok(n)) => Self::Min(n),
                ("max", Ok(n)) => Self::Max(n),
                _ => Self::Other(raw.to_string()),
            };
        }
        match raw {
            "required" => Self::Required,
            "email" => Self::Email,
            "mongoid" => Self::MongoId,
            "tz" => Self::Tz,
            "embed" => Self::Embed,
            "unique" => Self::Unique,
            "index" => Self::Index,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::Min(n) => write!(f, "min={n}"),
            Self::Max(n) => write!(f, "max={n}"),
            Self::Email => f.write_str("email"),
            Self::MongoId => f.write_str("mongoid"),
            Self::Tz => f.write_str("tz"),
            Self::Embed => f.write_str("embed"),
            Self::Unique => f.write_str("unique"),
            Self::Index => f.write_str("index"),
            Self::Other(s) => f.write_str(s),
        }
    }
}
