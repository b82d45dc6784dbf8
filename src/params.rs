use bson::Bson;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction for a [`SortParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single equality condition. Keys are checked by the adapter, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    key: String,
    value: Bson,
}

impl Params {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn value(&self) -> &Bson {
        &self.value
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Bson) {
        (self.key, self.value)
    }
}

/// A sort key and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortParams {
    key: String,
    order: SortOrder,
}

impl SortParams {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn order(&self) -> SortOrder {
        self.order
    }
}

pub fn set_param(key: impl Into<String>, value: impl Into<Bson>) -> Params {
    Params { key: key.into(), value: value.into() }
}

pub fn set_sort(key: impl Into<String>, order: SortOrder) -> SortParams {
    SortParams { key: key.into(), order }
}
