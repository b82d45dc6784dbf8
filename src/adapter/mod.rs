//! Document-store adapter: clients, databases and bound models.
//!
//! ```ignore
//! let client = Client::connect(&ClientConfig::default()).await?;
//! let users = register_model::<User>(&client.database("app"), "users")?;
//! let adults = users
//!     .find([set_param("active", true)])
//!     .many()
//!     .sort([set_sort("age", SortOrder::Asc)])
//!     .limit(10)
//!     .exec(&client.context())
//!     .await?;
//! ```

mod model;
mod schema;
pub mod translate;

pub use model::{
    DeleteExec, DeleteQuery, DocumentModel, FindManyQuery, FindOneQuery, FindQuery, SaveExec, SaveQuery, UpdateExec,
    UpdateQuery,
};
pub use schema::Schema;

use crate::backend::{Backend, MemoryBackend, Namespace};
use crate::config::ClientConfig;
use crate::context::Context;
use crate::errors::{DbError, OpKind};
use crate::parser::Record;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

static GLOBAL: OnceCell<Client> = OnceCell::const_new();

/// Handle to a connected backend. Clones share the connection.
#[derive(Debug, Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
    exec_timeout: Option<Duration>,
}

fn backend_for_uri(uri: &str) -> Result<Arc<dyn Backend>, DbError> {
    let Some((scheme, _rest)) = uri.split_once("://") else {
        return Err(DbError::Connect(format!("invalid uri `{uri}`: missing scheme")));
    };
    match scheme {
        "memory" => Ok(Arc::new(MemoryBackend::new())),
        other => Err(DbError::Connect(format!("unsupported uri scheme `{other}`"))),
    }
}

impl Client {
    /// Resolves the backend from `cfg.uri` and pings it within the connect timeout.
    ///
    /// Every `memory://` connect gets a fresh, empty store.
    ///
    /// # Errors
    /// `DbError::Connect` for unknown schemes, failed pings or ping timeouts.
    pub async fn connect(cfg: &ClientConfig) -> Result<Self, DbError> {
        let backend = backend_for_uri(&cfg.uri)?;
        let client = Self::with_backend(backend, cfg.connect_timeout()).await?;
        log::info!("connected to {} (database `{}`)", cfg.uri, cfg.database);
        Ok(client.with_exec_timeout(cfg.exec_timeout()))
    }

    /// Wraps an existing backend after a successful ping within `timeout`.
    ///
    /// # Errors
    /// `DbError::Connect` if the ping fails or does not finish in time.
    pub async fn with_backend(backend: Arc<dyn Backend>, timeout: Duration) -> Result<Self, DbError> {
        let answered = tokio::time::timeout(timeout, backend.ping()).await;
        match answered {
            Ok(Ok(())) => Ok(Self { backend, exec_timeout: None }),
            Ok(Err(e)) => Err(DbError::Connect(format!("{} backend: {e}", backend.kind()))),
            Err(_) => Err(DbError::Connect(format!("{} backend did not answer within {timeout:?}", backend.kind()))),
        }
    }

    /// Process-wide client. The first successful caller's config wins; a
    /// failed attempt leaves the slot empty for the next caller.
    ///
    /// # Errors
    /// Whatever [`Client::connect`] returns for the first attempt.
    pub async fn global(cfg: &ClientConfig) -> Result<&'static Self, DbError> {
        GLOBAL.get_or_try_init(|| Self::connect(cfg)).await
    }

    #[must_use]
    pub fn with_exec_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// A fresh context carrying the default exec timeout, if any.
    #[must_use]
    pub fn context(&self) -> Context {
        self.exec_timeout.map_or_else(Context::background, Context::with_timeout)
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// # Errors
    /// `DbError::Backend` when the store does not answer, or the context fires first.
    pub async fn ping(&self, ctx: &Context) -> Result<(), DbError> {
        ctx.run(async { self.backend.ping().await.map_err(|e| DbError::from_store(OpKind::Ping, "", e)) }).await
    }

    #[must_use]
    pub fn database(&self, name: impl Into<String>) -> Database {
        Database { client: self.clone(), name: name.into() }
    }
}

/// A logical database on a client.
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    name: String,
}

impl Database {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn namespace(&self, collection: &str) -> Namespace {
        Namespace::new(self.name.clone(), collection)
    }

    /// Same as [`register_model`].
    ///
    /// # Errors
    /// See [`register_model`].
    pub fn model<T: Record>(&self, collection: &str) -> Result<DocumentModel<T>, DbError> {
        register_model(self, collection)
    }
}

fn check_collection_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() || name.starts_with('$') || name.contains('\0') {
        return Err(DbError::Validation(format!("invalid collection name {name:?}")));
    }
    Ok(())
}

/// Binds `T` to `collection` in `db`.
///
/// # Errors
/// `DbError::Validation` for a malformed collection name or when two fields of
/// `T` share a storage key.
pub fn register_model<T: Record>(db: &Database, collection: &str) -> Result<DocumentModel<T>, DbError> {
    check_collection_name(collection)?;
    let model = DocumentModel::bind(Arc::clone(&db.client.backend), db.namespace(collection))?;
    log::debug!("registered {} fields on {}", T::FIELDS.len(), model.namespace());
    Ok(model)
}
