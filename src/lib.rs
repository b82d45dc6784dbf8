//! Typed, backend-agnostic data access for document stores.
//!
//! Records describe their fields with `#[derive(Record)]`; a [`adapter::DocumentModel`]
//! binds a record type to a collection and hands out staged query builders
//! ([`database`]) that translate filters, sorts and records into BSON and run a
//! single backend call per `exec`.

extern crate self as siddon;

pub mod adapter;
pub mod backend;
pub mod config;
pub mod context;
pub mod database;
pub mod errors;
pub mod params;
pub mod parser;
pub mod prelude;
pub mod utils;

pub use bson;
pub use siddon_derive::Record;

pub use adapter::{Client, Database, DocumentModel, register_model};
pub use config::ClientConfig;
pub use context::Context;
pub use errors::{DbError, OpKind};
pub use params::{Params, SortOrder, SortParams, set_param, set_sort};
pub use parser::{Attribute, FieldDef, FieldValue, ParsedField, Record, parse};
pub use utils::logger;

/// Initializes logging from `log4rs.yaml` when present, else from `SIDDON_LOG_*` variables.
///
/// # Errors
/// Returns an error if a logging configuration exists but cannot be applied.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if std::path::Path::new("log4rs.yaml").exists() {
        return logger::init();
    }
    if std::env::var_os("SIDDON_LOG_DIR").is_some() || std::env::var_os("SIDDON_LOG_LEVEL").is_some() {
        return logger::configure_from_env();
    }
    Ok(())
}
