use thiserror::Error;

/// Failures reported by a [`Backend`](super::Backend).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("duplicate key on index `{index}`: {key}")]
    DuplicateKey { index: String, key: String },

    #[error("bad query: {0}")]
    BadQuery(String),

    #[error("batch interrupted after {applied} of {attempted} writes: {source}")]
    Interrupted {
        applied: u64,
        attempted: u64,
        #[source]
        source: Box<StoreError>,
    },

    #[error("backend closed")]
    Closed,
}
