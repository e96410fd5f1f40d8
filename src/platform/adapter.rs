use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value as JsonValue;
use serde_json::json;
use tracing::debug;

use crate::backend::DataBackend;
use crate::config::PlatformOptions;
use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::types::{BackendKind, Row};

use super::executor::{decode_rows, transport_error};
use super::query::{filter_pairs, order_pair, range_header};

/// Concrete adapter for the managed data platform.
///
/// Every operation is one authenticated HTTP request; there is no
/// connection pool at this layer. Queries chain declarative filter pairs
/// onto the request instead of assembling SQL text.
pub struct PlatformAdapter {
    http: reqwest::Client,
    options: PlatformOptions,
}

impl PlatformAdapter {
    /// Build the adapter with default auth headers on every request.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Config` when the service key is not a valid
    /// header value, `DatastoreError::Connection` when the HTTP client
    /// cannot be constructed.
    pub fn new(options: PlatformOptions) -> Result<Self, DatastoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&options.api_key)
            .map_err(|_| DatastoreError::Config("platform key is not header-safe".to_string()))?;
        headers.insert("apikey", key);
        let bearer = HeaderValue::from_str(&format!("Bearer {}", options.api_key))
            .map_err(|_| DatastoreError::Config("platform key is not header-safe".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DatastoreError::Connection(format!("HTTP client error: {e}")))?;
        Ok(Self { http, options })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.options.url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.options.url)
    }

    fn rpc_url(&self, procedure: &str) -> String {
        format!("{}/rest/v1/rpc/{procedure}", self.options.url)
    }
}

#[async_trait]
impl DataBackend for PlatformAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Platform
    }

    fn supports_atomic_transactions(&self) -> bool {
        false
    }

    async fn connect(&self) -> Result<(), DatastoreError> {
        let response = self
            .http
            .get(format!("{}/rest/v1/", self.options.url))
            .send()
            .await
            .map_err(|e| transport_error("platform probe", &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DatastoreError::Connection(format!(
                "platform rejected the probe: {status}"
            )));
        }
        debug!(url = %self.options.url, "platform backend connected");
        Ok(())
    }

    async fn select_rows(
        &self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, DatastoreError> {
        if options.limit == Some(0) {
            return Ok(Vec::new());
        }
        let mut pairs = vec![(
            "select".to_string(),
            options.columns.clone().unwrap_or_else(|| "*".to_string()),
        )];
        pairs.extend(filter_pairs(&options.filter)?);
        if let Some(order) = options.order()? {
            pairs.push(order_pair(&order));
        }
        let mut request = self.http.get(self.table_url(table)).query(&pairs);
        if let Some(range) = range_header(options.limit, options.offset) {
            request = request.header("Range-Unit", "items").header("Range", range);
        }
        let response = request
            .send()
            .await
            .map_err(|e| transport_error("select", &e))?;
        decode_rows(response, "select").await
    }

    async fn insert_row(&self, table: &str, data: Row) -> Result<Row, DatastoreError> {
        let response = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&JsonValue::Object(data))
            .send()
            .await
            .map_err(|e| transport_error("insert", &e))?;
        let rows = decode_rows(response, "insert").await?;
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
        let pairs = filter_pairs(filter)?;
        let response = self
            .http
            .patch(self.table_url(table))
            .query(&pairs)
            .header("Prefer", "return=representation")
            .json(&JsonValue::Object(data))
            .send()
            .await
            .map_err(|e| transport_error("update", &e))?;
        decode_rows(response, "update").await
    }

    async fn delete_rows(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        let pairs = filter_pairs(filter)?;
        let response = self
            .http
            .delete(self.table_url(table))
            .query(&pairs)
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| transport_error("delete", &e))?;
        let rows = decode_rows(response, "delete").await?;
        Ok(rows.len() as u64)
    }

    async fn raw_query(
        &self,
        statement: &str,
        params: &[JsonValue],
    ) -> Result<Vec<Row>, DatastoreError> {
        // No direct SQL execution on this backend; the statement names a
        // server-side procedure and positional values travel as its args.
        let response = self
            .http
            .post(self.rpc_url(statement))
            .json(&json!({ "args": params }))
            .send()
            .await
            .map_err(|e| transport_error("rpc", &e))?;
        decode_rows(response, "rpc").await
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DatastoreError> {
        self.storage_upload(bucket, path, content_type, bytes).await
    }

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), DatastoreError> {
        self.storage_delete(bucket, path).await
    }

    fn file_url(&self, bucket: &str, path: &str) -> String {
        self.public_object_url(bucket, path)
    }
}
