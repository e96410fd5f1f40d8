use reqwest::{Response, StatusCode};
use serde_json::Value as JsonValue;

use crate::error::DatastoreError;
use crate::types::Row;

/// Map a transport-level failure: the request never reached the backend.
pub(crate) fn transport_error(context: &str, e: &reqwest::Error) -> DatastoreError {
    DatastoreError::Connection(format!("{context}: {e}"))
}

/// Turn a response into JSON rows, mapping non-success statuses into the
/// error taxonomy. The platform reports failures as a JSON body with a
/// `message` field; that message is surfaced verbatim.
pub(crate) async fn decode_rows(
    response: Response,
    context: &str,
) -> Result<Vec<Row>, DatastoreError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(context, status, response).await);
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }
    let body = response
        .text()
        .await
        .map_err(|e| DatastoreError::Backend(format!("{context}: unreadable response: {e}")))?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: JsonValue = serde_json::from_str(&body)
        .map_err(|e| DatastoreError::Backend(format!("{context}: malformed response: {e}")))?;
    Ok(rows_from_value(value))
}

/// Check a response for success, discarding any body.
pub(crate) async fn expect_success(
    response: Response,
    context: &str,
) -> Result<(), DatastoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(status_error(context, status, response).await)
    }
}

async fn status_error(context: &str, status: StatusCode, response: Response) -> DatastoreError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<JsonValue>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error_description"))
                .or_else(|| v.get("msg"))
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);
    DatastoreError::Backend(format!("{context}: {status}: {message}"))
}

/// Normalize a response value into rows. Selects and mutations return row
/// arrays; procedure calls may return a bare object or scalar.
fn rows_from_value(value: JsonValue) -> Vec<Row> {
    match value {
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::Object(map) => map,
                scalar => singleton("value", scalar),
            })
            .collect(),
        JsonValue::Object(map) => vec![map],
        scalar => vec![singleton("result", scalar)],
    }
}

fn singleton(key: &str, value: JsonValue) -> Row {
    let mut row = Row::new();
    row.insert(key.to_string(), value);
    row
}
