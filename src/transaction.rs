//! The restricted adapter view handed to transaction callbacks.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value as JsonValue;

use crate::backend::DataBackend;
use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::relational::transaction::RelationalTx;
use crate::types::Row;

/// Callback signature for [`transaction`](crate::service::BackendService::transaction).
pub type TxCallback<'t, T> = BoxFuture<'t, Result<T, DatastoreError>>;

pub(crate) enum TxInner {
    /// Relational: one pinned pooled connection with an open server-side
    /// transaction; commit and rollback are real.
    Pinned(RelationalTx),
    /// Pass-through for backends without native atomicity: operations run
    /// directly against the shared adapter and nothing is rolled back.
    Shared(Arc<dyn DataBackend>),
}

/// A restricted adapter bound to one in-flight unit of work.
///
/// Exposes only the data operations, not connect or file storage. The
/// facade consumes the context on commit or rollback, so it cannot be
/// reused after either outcome. Calling `transaction` on a context flattens
/// onto the existing one rather than nesting.
pub struct TransactionContext {
    inner: TxInner,
}

impl TransactionContext {
    pub(crate) fn pinned(tx: RelationalTx) -> Self {
        Self {
            inner: TxInner::Pinned(tx),
        }
    }

    pub(crate) fn shared(backend: Arc<dyn DataBackend>) -> Self {
        Self {
            inner: TxInner::Shared(backend),
        }
    }

    pub async fn select_rows(
        &mut self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, DatastoreError> {
        match &mut self.inner {
            TxInner::Pinned(tx) => tx.select_rows(table, options).await,
            TxInner::Shared(backend) => backend.select_rows(table, options).await,
        }
    }

    pub async fn insert_row(&mut self, table: &str, data: Row) -> Result<Row, DatastoreError> {
        match &mut self.inner {
            TxInner::Pinned(tx) => tx.insert_row(table, data).await,
            TxInner::Shared(backend) => backend.insert_row(table, data).await,
        }
    }

    pub async fn update_rows(
        &mut self,
        table: &str,
        data: Row,
        filter: &Filter,
    ) -> Result<Vec<Row>, DatastoreError> {
        match &mut self.inner {
            TxInner::Pinned(tx) => tx.update_rows(table, data, filter).await,
            TxInner::Shared(backend) => backend.update_rows(table, data, filter).await,
        }
    }

    pub async fn delete_rows(
        &mut self,
        table: &str,
        filter: &Filter,
    ) -> Result<u64, DatastoreError> {
        match &mut self.inner {
            TxInner::Pinned(tx) => tx.delete_rows(table, filter).await,
            TxInner::Shared(backend) => backend.delete_rows(table, filter).await,
        }
    }

    pub async fn raw_query(
        &mut self,
        statement: &str,
        params: &[JsonValue],
    ) -> Result<Vec<Row>, DatastoreError> {
        match &mut self.inner {
            TxInner::Pinned(tx) => tx.raw_query(statement, params).await,
            TxInner::Shared(backend) => backend.raw_query(statement, params).await,
        }
    }

    /// Nested transactions flatten: the callback runs against this same
    /// context and the outer caller still owns commit/rollback.
    pub async fn transaction<T, F>(&mut self, f: F) -> Result<T, DatastoreError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut TransactionContext) -> TxCallback<'t, T> + Send,
    {
        f(self).await
    }

    pub(crate) async fn commit(self) -> Result<(), DatastoreError> {
        match self.inner {
            TxInner::Pinned(tx) => tx.commit().await,
            TxInner::Shared(_) => Ok(()),
        }
    }

    pub(crate) async fn rollback(self) -> Result<(), DatastoreError> {
        match self.inner {
            TxInner::Pinned(tx) => tx.rollback().await,
            TxInner::Shared(_) => Ok(()),
        }
    }
}
