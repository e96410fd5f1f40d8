//! The process-wide facade over the selected backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::backend::{BackendStatus, DataBackend};
use crate::config::DatabaseConfig;
use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::platform::PlatformAdapter;
use crate::relational::RelationalAdapter;
use crate::transaction::{TransactionContext, TxCallback};
use crate::types::{BackendKind, Row, from_row, to_row};

static GLOBAL: OnceCell<Arc<BackendService>> = OnceCell::new();

enum AnyAdapter {
    Platform(Arc<PlatformAdapter>),
    Relational(Arc<RelationalAdapter>),
    #[cfg(any(test, feature = "test-utils"))]
    Memory(Arc<crate::test_utils::MemoryBackend>),
}

impl AnyAdapter {
    fn backend(&self) -> &dyn DataBackend {
        match self {
            Self::Platform(adapter) => adapter.as_ref(),
            Self::Relational(adapter) => adapter.as_ref(),
            #[cfg(any(test, feature = "test-utils"))]
            Self::Memory(backend) => backend.as_ref(),
        }
    }
}

/// Owns exactly one backend adapter for the process lifetime and forwards
/// every operation to it. Callers never learn which backend is in effect
/// except through [`status`](Self::status).
pub struct BackendService {
    adapter: AnyAdapter,
    connected: AtomicBool,
}

impl BackendService {
    /// Construct from configuration and establish the physical connection.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Connection` when credentials or network are
    /// invalid; the error is surfaced verbatim, not retried.
    pub async fn connect_with(config: DatabaseConfig) -> Result<Self, DatastoreError> {
        let adapter = match config {
            DatabaseConfig::Platform(options) => {
                AnyAdapter::Platform(Arc::new(PlatformAdapter::new(options)?))
            }
            DatabaseConfig::Relational(options) => {
                AnyAdapter::Relational(Arc::new(RelationalAdapter::new(options)?))
            }
        };
        let service = Self {
            adapter,
            connected: AtomicBool::new(false),
        };
        service.adapter.backend().connect().await?;
        service.connected.store(true, Ordering::SeqCst);
        info!(backend = %service.kind(), "datastore backend connected");
        Ok(service)
    }

    /// Construct the facade over the in-memory test backend.
    ///
    /// # Errors
    ///
    /// Returns the backend's simulated connection failure, if armed.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn with_memory(
        backend: Arc<crate::test_utils::MemoryBackend>,
    ) -> Result<Self, DatastoreError> {
        backend.connect().await?;
        Ok(Self {
            adapter: AnyAdapter::Memory(backend),
            connected: AtomicBool::new(true),
        })
    }

    /// Initialize the process-wide instance. Backend selection is immutable
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Config` when called twice, or any
    /// connection error from [`connect_with`](Self::connect_with).
    pub async fn initialize(config: DatabaseConfig) -> Result<Arc<Self>, DatastoreError> {
        let service = Arc::new(Self::connect_with(config).await?);
        GLOBAL
            .set(Arc::clone(&service))
            .map_err(|_| DatastoreError::Config("backend service already initialized".to_string()))?;
        Ok(service)
    }

    /// The process-wide instance, if [`initialize`](Self::initialize) ran.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Config` before initialization.
    pub fn global() -> Result<Arc<Self>, DatastoreError> {
        GLOBAL.get().cloned().ok_or_else(|| {
            DatastoreError::Config("backend service is not initialized".to_string())
        })
    }

    /// Close the underlying resources. The selection stays immutable; a
    /// shut-down service reports `connected == false`.
    pub async fn shutdown(&self) {
        if let AnyAdapter::Relational(adapter) = &self.adapter {
            adapter.close();
        }
        self.connected.store(false, Ordering::SeqCst);
        info!(backend = %self.kind(), "datastore backend shut down");
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.adapter.backend().kind()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn status(&self) -> BackendStatus {
        BackendStatus {
            kind: self.kind(),
            connected: self.is_connected(),
        }
    }

    #[must_use]
    pub fn supports_atomic_transactions(&self) -> bool {
        self.adapter.backend().supports_atomic_transactions()
    }

    pub async fn select_rows(
        &self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, DatastoreError> {
        self.adapter.backend().select_rows(table, options).await
    }

    pub async fn insert_row(&self, table: &str, data: Row) -> Result<Row, DatastoreError> {
        self.adapter.backend().insert_row(table, data).await
    }

    pub async fn update_rows(
        &self,
        table: &str,
        data: Row,
        filter: &Filter,
    ) -> Result<Vec<Row>, DatastoreError> {
        self.adapter.backend().update_rows(table, data, filter).await
    }

    pub async fn delete_rows(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        self.adapter.backend().delete_rows(table, filter).await
    }

    pub async fn raw_query(
        &self,
        statement: &str,
        params: &[JsonValue],
    ) -> Result<Vec<Row>, DatastoreError> {
        self.adapter.backend().raw_query(statement, params).await
    }

    pub async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DatastoreError> {
        self.adapter
            .backend()
            .upload_file(bucket, path, content_type, bytes)
            .await
    }

    pub async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), DatastoreError> {
        self.adapter.backend().delete_file(bucket, path).await
    }

    #[must_use]
    pub fn file_url(&self, bucket: &str, path: &str) -> String {
        self.adapter.backend().file_url(bucket, path)
    }

    /// Typed select: rows deserialized into `T`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<T>, DatastoreError> {
        let rows = self.select_rows(table, options).await?;
        rows.into_iter().map(from_row).collect()
    }

    /// Typed single-row select; absence is `Ok(None)`, distinct from a
    /// failure.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        options: SelectOptions,
    ) -> Result<Option<T>, DatastoreError> {
        let rows = self.select_rows(table, &options.limit(1)).await?;
        rows.into_iter().next().map(from_row).transpose()
    }

    /// Typed insert: the payload is serialized to a row, the persisted row
    /// deserialized back.
    pub async fn insert<T: DeserializeOwned, P: Serialize>(
        &self,
        table: &str,
        payload: &P,
    ) -> Result<T, DatastoreError> {
        let row = self.insert_row(table, to_row(payload)?).await?;
        from_row(row)
    }

    /// Typed update: returns the mutated rows.
    pub async fn update<T: DeserializeOwned>(
        &self,
        table: &str,
        patch: Row,
        filter: &Filter,
    ) -> Result<Vec<T>, DatastoreError> {
        let rows = self.update_rows(table, patch, filter).await?;
        rows.into_iter().map(from_row).collect()
    }

    /// Run `f` inside a unit of work: commit when it resolves, roll back
    /// and re-raise its error unchanged when it fails.
    ///
    /// On the relational backend this is a real server-side transaction on
    /// a pinned connection. On the platform backend the callback runs
    /// without atomicity; check
    /// [`supports_atomic_transactions`](Self::supports_atomic_transactions)
    /// before relying on rollback.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, DatastoreError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut TransactionContext) -> TxCallback<'t, T> + Send,
    {
        let mut ctx = match &self.adapter {
            AnyAdapter::Relational(adapter) => TransactionContext::pinned(adapter.begin().await?),
            AnyAdapter::Platform(adapter) => {
                TransactionContext::shared(Arc::clone(adapter) as Arc<dyn DataBackend>)
            }
            #[cfg(any(test, feature = "test-utils"))]
            AnyAdapter::Memory(backend) => {
                TransactionContext::shared(Arc::clone(backend) as Arc<dyn DataBackend>)
            }
        };
        match f(&mut ctx).await {
            Ok(value) => {
                ctx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = ctx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after callback error");
                }
                Err(err)
            }
        }
    }
}
