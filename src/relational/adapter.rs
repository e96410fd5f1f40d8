use async_trait::async_trait;
use chrono::Utc;
use deadpool::managed::Object;
use serde_json::Value as JsonValue;
use serde_json::json;
use tracing::debug;

use crate::backend::DataBackend;
use crate::config::RelationalOptions;
use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::types::{BackendKind, Row, datetime_compat};

use super::executor::{run_execute, run_query};
use super::pool::{ConnectionManager, SqlPool, build_pool};
use super::sql;
use super::transaction::RelationalTx;

/// Table carrying file metadata; the relational backend has no object store
/// of its own, so uploads record shape and location and the bytes live
/// behind `file_base_url`.
const FILES_TABLE: &str = "stored_files";

/// Concrete adapter for the SQL Server backend.
pub struct RelationalAdapter {
    pool: SqlPool,
    options: RelationalOptions,
}

impl RelationalAdapter {
    /// Build the adapter and its pool. No connection is opened until
    /// [`DataBackend::connect`] runs.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Connection` if the pool cannot be
    /// configured.
    pub fn new(options: RelationalOptions) -> Result<Self, DatastoreError> {
        let pool = build_pool(&options)?;
        Ok(Self { pool, options })
    }

    async fn conn(&self) -> Result<Object<ConnectionManager>, DatastoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| DatastoreError::Connection(format!("SQL Server pool error: {e}")))
    }

    /// Pin a connection and open a server-side transaction on it.
    pub(crate) async fn begin(&self) -> Result<RelationalTx, DatastoreError> {
        let conn = self.conn().await?;
        RelationalTx::begin(conn).await
    }

    pub(crate) fn close(&self) {
        self.pool.close();
    }
}

#[async_trait]
impl DataBackend for RelationalAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn supports_atomic_transactions(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<(), DatastoreError> {
        let mut conn = self.conn().await?;
        run_execute(&mut conn, "SELECT 1")
            .await
            .map_err(|e| DatastoreError::Connection(format!("SQL Server probe failed: {e}")))?;
        debug!(host = %self.options.host, database = %self.options.database, "relational backend connected");
        Ok(())
    }

    async fn select_rows(
        &self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, DatastoreError> {
        let built = sql::build_select(table, options)?;
        let mut conn = self.conn().await?;
        run_query(&mut conn, &built.sql, &built.params).await
    }

    async fn insert_row(&self, table: &str, data: Row) -> Result<Row, DatastoreError> {
        let built = sql::build_insert(table, &data)?;
        let mut conn = self.conn().await?;
        let rows = run_query(&mut conn, &built.sql, &built.params).await?;
        rows.into_iter().next().ok_or_else(|| {
            DatastoreError::Backend(format!("insert into '{table}' returned no row"))
        })
    }

    async fn update_rows(
        &self,
        table: &str,
        data: Row,
        filter: &Filter,
    ) -> Result<Vec<Row>, DatastoreError> {
        let built = sql::build_update(table, &data, filter)?;
        let mut conn = self.conn().await?;
        run_query(&mut conn, &built.sql, &built.params).await
    }

    async fn delete_rows(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        let built = sql::build_delete(table, filter)?;
        let mut conn = self.conn().await?;
        let rows = run_query(&mut conn, &built.sql, &built.params).await?;
        Ok(rows.len() as u64)
    }

    async fn raw_query(
        &self,
        statement: &str,
        params: &[JsonValue],
    ) -> Result<Vec<Row>, DatastoreError> {
        let mut conn = self.conn().await?;
        run_query(&mut conn, statement, params).await
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DatastoreError> {
        let filename = path.rsplit('/').next().unwrap_or(path);
        let uploaded_at = Utc::now()
            .naive_utc()
            .format(datetime_compat::STAMP_FORMAT)
            .to_string();
        let mut metadata = Row::new();
        metadata.insert("bucket".to_string(), json!(bucket));
        metadata.insert("path".to_string(), json!(path));
        metadata.insert("filename".to_string(), json!(filename));
        metadata.insert("content_type".to_string(), json!(content_type));
        metadata.insert("size_bytes".to_string(), json!(bytes.len() as u64));
        metadata.insert("uploaded_at".to_string(), json!(uploaded_at));
        self.insert_row(FILES_TABLE, metadata).await?;
        Ok(self.file_url(bucket, path))
    }

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), DatastoreError> {
        let filter = Filter::new().eq("bucket", bucket).eq("path", path);
        self.delete_rows(FILES_TABLE, &filter).await?;
        Ok(())
    }

    fn file_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{bucket}/{path}", self.options.file_base_url)
    }
}
