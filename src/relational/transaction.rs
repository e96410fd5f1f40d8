use deadpool::managed::Object;
use serde_json::Value as JsonValue;

use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::types::Row;

use super::executor::{run_execute, run_query};
use super::pool::ConnectionManager;
use super::sql;

/// A server-side transaction pinned to one pooled connection.
///
/// The connection stays checked out for the transaction's lifetime and goes
/// back to the pool when the context is dropped after commit or rollback.
/// Dropping without finishing leaves the connection mid-transaction, so the
/// facade always finishes explicitly.
pub(crate) struct RelationalTx {
    conn: Object<ConnectionManager>,
    open: bool,
}

impl RelationalTx {
    /// Issue `BEGIN TRANSACTION` on a freshly pinned connection.
    pub(crate) async fn begin(mut conn: Object<ConnectionManager>) -> Result<Self, DatastoreError> {
        run_execute(&mut conn, "BEGIN TRANSACTION")
            .await
            .map_err(|e| DatastoreError::Transaction(format!("begin failed: {e}")))?;
        Ok(Self { conn, open: true })
    }

    pub(crate) async fn select_rows(
        &mut self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, DatastoreError> {
        let built = sql::build_select(table, options)?;
        run_query(&mut self.conn, &built.sql, &built.params).await
    }

    pub(crate) async fn insert_row(
        &mut self,
        table: &str,
        data: Row,
    ) -> Result<Row, DatastoreError> {
        let built = sql::build_insert(table, &data)?;
        let rows = run_query(&mut self.conn, &built.sql, &built.params).await?;
        rows.into_iter().next().ok_or_else(|| {
            DatastoreError::Backend(format!("insert into '{table}' returned no row"))
        })
    }

    pub(crate) async fn update_rows(
        &mut self,
        table: &str,
        data: Row,
        filter: &Filter,
    ) -> Result<Vec<Row>, DatastoreError> {
        let built = sql::build_update(table, &data, filter)?;
        run_query(&mut self.conn, &built.sql, &built.params).await
    }

    pub(crate) async fn delete_rows(
        &mut self,
        table: &str,
        filter: &Filter,
    ) -> Result<u64, DatastoreError> {
        let built = sql::build_delete(table, filter)?;
        let rows = run_query(&mut self.conn, &built.sql, &built.params).await?;
        Ok(rows.len() as u64)
    }

    pub(crate) async fn raw_query(
        &mut self,
        statement: &str,
        params: &[JsonValue],
    ) -> Result<Vec<Row>, DatastoreError> {
        run_query(&mut self.conn, statement, params).await
    }

    pub(crate) async fn commit(mut self) -> Result<(), DatastoreError> {
        if self.open {
            run_execute(&mut self.conn, "COMMIT TRANSACTION")
                .await
                .map_err(|e| DatastoreError::Transaction(format!("commit failed: {e}")))?;
            self.open = false;
        }
        Ok(())
    }

    pub(crate) async fn rollback(mut self) -> Result<(), DatastoreError> {
        if self.open {
            run_execute(&mut self.conn, "ROLLBACK TRANSACTION")
                .await
                .map_err(|e| DatastoreError::Transaction(format!("rollback failed: {e}")))?;
            self.open = false;
        }
        Ok(())
    }
}
