use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::error::DatastoreError;

/// A single table row as both backends speak it at the seam: a JSON object
/// keyed by column name.
pub type Row = serde_json::Map<String, JsonValue>;

/// The storage backend selected at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Managed multi-tenant data platform with a declarative REST filter
    /// API and built-in object storage.
    Platform,
    /// SQL Server reached through pooled, parameterized connections.
    Relational,
    /// In-memory test double.
    #[cfg(any(test, feature = "test-utils"))]
    Memory,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform => write!(f, "platform"),
            Self::Relational => write!(f, "relational"),
            #[cfg(any(test, feature = "test-utils"))]
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Server-assigned row identifier.
///
/// The platform backend hands out string identifiers while the relational
/// backend uses integer identity columns; this newtype keeps entity types
/// backend-agnostic without forcing a parse either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(JsonValue);

impl RecordId {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64()
    }

    /// The raw JSON value, suitable for a filter predicate.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        self.0.clone()
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(JsonValue::from(id))
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(JsonValue::from(id))
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(JsonValue::from(id))
    }
}

impl From<RecordId> for JsonValue {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            JsonValue::String(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}

/// Serialize a value into a row object.
///
/// # Errors
///
/// Returns `DatastoreError::Decode` if the value does not serialize to a
/// JSON object.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, DatastoreError> {
    match serde_json::to_value(value)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(DatastoreError::Decode(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

/// Deserialize a row object into a caller type.
///
/// # Errors
///
/// Returns `DatastoreError::Decode` if the row does not match `T`.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, DatastoreError> {
    Ok(serde_json::from_value(JsonValue::Object(row))?)
}

/// Tolerant serde adapter for timestamp columns.
///
/// The platform returns RFC 3339 strings with an offset, SQL Server's
/// datetime2 round-trips as a naive `YYYY-MM-DDTHH:MM:SS.ffffff` string.
/// Entities accept either and always serialize the naive form.
pub mod datetime_compat {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(crate) const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub(crate) fn parse(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(dt);
            }
        }
        None
    }

    /// # Errors
    /// Never fails; signature required by serde.
    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.format(STAMP_FORMAT).to_string())
    }

    /// # Errors
    /// Fails when the string matches none of the accepted formats.
    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(de)?;
        parse(&s).ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {s}")))
    }
}

/// `Option` counterpart of [`datetime_compat`] for nullable timestamp
/// columns such as `confirmed_at`.
pub mod datetime_compat_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::datetime_compat;

    /// # Errors
    /// Never fails; signature required by serde.
    pub fn serialize<S: Serializer>(
        dt: &Option<NaiveDateTime>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => ser.serialize_str(&dt.format(datetime_compat::STAMP_FORMAT).to_string()),
            None => ser.serialize_none(),
        }
    }

    /// # Errors
    /// Fails when a present string matches none of the accepted formats.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let value = Option::<String>::deserialize(de)?;
        match value {
            None => Ok(None),
            Some(s) => datetime_compat::parse(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {s}"))),
        }
    }
}
