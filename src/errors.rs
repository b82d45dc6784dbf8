use crate::backend::StoreError;
use std::fmt;
use thiserror::Error;

/// Operation kinds attached to backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Ping,
    FindOne,
    FindMany,
    SaveOne,
    SaveMany,
    UpdateOne,
    UpdateMany,
    DeleteOne,
    DeleteMany,
    CreateIndex,
}

impl OpKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::FindOne => "find_one",
            Self::FindMany => "find_many",
            Self::SaveOne => "save_one",
            Self::SaveMany => "save_many",
            Self::UpdateOne => "update_one",
            Self::UpdateMany => "update_many",
            Self::DeleteOne => "delete_one",
            Self::DeleteMany => "delete_many",
            Self::CreateIndex => "create_index",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Type error: expected {expected}, got {found}")]
    TypeError { expected: &'static str, found: String },

    #[error("Unsupported type `{type_name}` for field `{field}`")]
    UnsupportedType { field: String, type_name: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No document in `{collection}` matched the filter")]
    NotFound { collection: String },

    #[error("{op} on `{collection}` failed: {source}")]
    Backend {
        op: OpKind,
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("{op} on `{collection}` partially applied ({applied} of {attempted}): {source}")]
    PartialWrite {
        op: OpKind,
        collection: String,
        applied: u64,
        attempted: u64,
        #[source]
        source: StoreError,
    },

    #[error("Operation canceled")]
    Canceled,

    #[error("Operation timed out")]
    TimedOut,

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Wraps a store failure with the operation and target collection.
    ///
    /// Interrupted batches that applied at least one write become `PartialWrite`;
    /// an interruption before any write is reported as the underlying failure.
    #[must_use]
    pub fn from_store(op: OpKind, collection: &str, err: StoreError) -> Self {
        match err {
            StoreError::Interrupted { applied, attempted, source } if applied > 0 => Self::PartialWrite {
                op,
                collection: collection.to_string(),
                applied,
                attempted,
                source: *source,
            },
            StoreError::Interrupted { source, .. } => Self::Backend {
                op,
                collection: collection.to_string(),
                source: *source,
            },
            source => Self::Backend { op, collection: collection.to_string(), source },
        }
    }

    /// True for `NotFound`, convenient for callers that treat a missing record as optional.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
