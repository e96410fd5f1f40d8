use serde_json::Value as JsonValue;
use tiberius::Query;

use crate::error::DatastoreError;

use super::pool::SqlClient;
use super::rows::rows_from_stream;
use crate::types::Row;

/// Run a row-returning statement with bound parameters.
///
/// All four structured operations go through here: the mutating builders
/// carry OUTPUT clauses, so they return rows like a select does.
pub(crate) async fn run_query(
    client: &mut SqlClient,
    sql: &str,
    params: &[JsonValue],
) -> Result<Vec<Row>, DatastoreError> {
    let mut query = Query::new(sql.to_string());
    super::params::bind_json_params(&mut query, params);
    let stream = query
        .query(client)
        .await
        .map_err(|e| DatastoreError::Backend(format!("SQL Server query error: {e}")))?;
    rows_from_stream(stream).await
}

/// Run a statement for effect only (transaction control, probes).
pub(crate) async fn run_execute(client: &mut SqlClient, sql: &str) -> Result<u64, DatastoreError> {
    let result = Query::new(sql.to_string())
        .execute(client)
        .await
        .map_err(|e| DatastoreError::Backend(format!("SQL Server execution error: {e}")))?;
    Ok(result.rows_affected().iter().sum())
}
