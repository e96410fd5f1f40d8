//! The operation contract every physical backend implements.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::types::{BackendKind, Row};

/// One storage backend behind the facade.
///
/// Both concrete adapters implement this trait; callers above the facade
/// never see it directly. Every method is an independent async operation
/// that resolves to a `Result`; backend failures come back as `Err`
/// values, never as panics.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Which physical backend this is.
    fn kind(&self) -> BackendKind;

    /// Whether `transaction()` on this backend really rolls back on error.
    ///
    /// The managed platform executes the callback without server-side
    /// atomicity; callers that need all-or-nothing writes must check this
    /// flag rather than assume parity.
    fn supports_atomic_transactions(&self) -> bool;

    /// Establish and validate the physical connection. Called once per
    /// process lifetime, before the first operation.
    async fn connect(&self) -> Result<(), DatastoreError>;

    /// Read rows matching `options`. An empty filter matches every row.
    async fn select_rows(
        &self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, DatastoreError>;

    /// Write one row and return it as persisted, server-assigned fields
    /// included.
    async fn insert_row(&self, table: &str, data: Row) -> Result<Row, DatastoreError>;

    /// Apply `data` to every row matching `filter`; returns the updated
    /// rows.
    async fn update_rows(
        &self,
        table: &str,
        data: Row,
        filter: &Filter,
    ) -> Result<Vec<Row>, DatastoreError>;

    /// Remove matching rows and return how many were removed. A filter that
    /// matches nothing is `Ok(0)`. An empty filter removes every row.
    async fn delete_rows(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError>;

    /// Escape hatch for operations the structured methods cannot express.
    ///
    /// On the relational backend `statement` is parameterized SQL with
    /// `@P1…@Pn` placeholders; on the platform backend it names a
    /// server-side procedure and the positional values travel as its `args`
    /// array.
    async fn raw_query(
        &self,
        statement: &str,
        params: &[JsonValue],
    ) -> Result<Vec<Row>, DatastoreError>;

    /// Store a binary object and return its public URL.
    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DatastoreError>;

    /// Remove a stored object.
    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), DatastoreError>;

    /// Public URL for a stored object. Pure computation, no round trip.
    fn file_url(&self, bucket: &str, path: &str) -> String;
}

/// Connection state and backend kind, reported by the facade for health
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendStatus {
    pub kind: BackendKind,
    pub connected: bool,
}
