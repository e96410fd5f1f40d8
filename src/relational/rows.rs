use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use serde_json::Value as JsonValue;
use tiberius::QueryStream;

use crate::error::DatastoreError;
use crate::types::{Row, datetime_compat};

/// Drain a query stream into JSON rows.
///
/// Statements that return no row set (rare with the OUTPUT-clause builders)
/// produce an empty vector rather than an error.
pub(crate) async fn rows_from_stream(stream: QueryStream<'_>) -> Result<Vec<Row>, DatastoreError> {
    let mut stream = stream;
    let columns: Vec<String> = match stream.columns().await.map_err(|e| {
        DatastoreError::Backend(format!("SQL Server column fetch error: {e}"))
    })? {
        Some(columns) => columns.iter().map(|col| col.name().to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    let mut row_stream = stream.into_row_stream();
    while let Some(row) = row_stream
        .try_next()
        .await
        .map_err(|e| DatastoreError::Backend(format!("SQL Server row fetch error: {e}")))?
    {
        let mut object = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            object.insert(name.clone(), value_at(&row, idx));
        }
        rows.push(object);
    }
    Ok(rows)
}

/// Extract one cell as JSON.
///
/// The driver's row API is typed per column, so this walks the value types
/// the marketplace schema uses; anything unreadable degrades to null rather
/// than failing the whole row.
fn value_at(row: &tiberius::Row, idx: usize) -> JsonValue {
    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return JsonValue::from(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return JsonValue::from(val);
    }
    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return JsonValue::from(f64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return JsonValue::from(val);
    }
    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return JsonValue::from(val);
    }
    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return JsonValue::from(val.format(datetime_compat::STAMP_FORMAT).to_string());
    }
    if let Ok(Some(val)) = row.try_get::<tiberius::Uuid, _>(idx) {
        return JsonValue::from(val.to_string());
    }
    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        // JSON columns round-trip as text; surface them structurally when
        // they parse, as the platform backend would return them.
        let trimmed = val.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(parsed) = serde_json::from_str::<JsonValue>(val) {
                return parsed;
            }
        }
        return JsonValue::from(val);
    }
    if let Ok(Some(val)) = row.try_get::<&[u8], _>(idx) {
        return JsonValue::from(BASE64.encode(val));
    }
    JsonValue::Null
}
