//! Everything needed to declare records and run queries.

pub use crate::adapter::{Client, Database, DocumentModel, register_model};
pub use crate::config::ClientConfig;
pub use crate::context::Context;
pub use crate::database::{
    DeleteReport, Exec, Find, FindMany, FindOne, Model, ModelDelete, ModelSave, ModelUpdate, SaveReport,
    UpdateReport,
};
pub use crate::errors::DbError;
pub use crate::params::{Params, SortOrder, SortParams, set_param, set_sort};
pub use crate::Record;
