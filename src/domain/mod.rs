//! Typed, entity-oriented convenience layer over the backend facade.
//!
//! Every insert stamps `created_at`/`updated_at`, every update stamps
//! `updated_at`. Absence ("not found") is `Ok(None)`; real failures come
//! back as the facade's errors untouched; this layer adds no error types
//! and no business-rule validation.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use serde_json::json;

use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::service::BackendService;
use crate::types::{RecordId, Row, datetime_compat, from_row, to_row};

pub mod entities;

mod bookings;
mod catalog;
mod users;

pub use entities::*;

/// Table names addressed by this layer. Callers of the generic facade use
/// the same strings; no schema introspection exists either way.
pub mod tables {
    pub const USERS: &str = "users";
    pub const SERVICES: &str = "services";
    pub const BOOKINGS: &str = "bookings";
    pub const EVENTS: &str = "events";
    pub const CATEGORIES: &str = "categories";
    pub const LOCATIONS: &str = "locations";
    pub const SITE_CONFIG: &str = "site_config";
    pub const ANALYTICS: &str = "analytics_events";
}

/// Bucket for listing and event media.
pub const MEDIA_BUCKET: &str = "media";

/// The typed entity layer. Cheap to clone; holds only the facade handle.
#[derive(Clone)]
pub struct DomainData {
    service: Arc<BackendService>,
}

impl DomainData {
    #[must_use]
    pub fn new(service: Arc<BackendService>) -> Self {
        Self { service }
    }

    #[must_use]
    pub fn backend(&self) -> &BackendService {
        &self.service
    }

    pub(crate) fn now_stamp() -> String {
        Utc::now()
            .naive_utc()
            .format(datetime_compat::STAMP_FORMAT)
            .to_string()
    }

    /// Serialize a payload and stamp both timestamps before insert.
    pub(crate) async fn stamped_insert<T, P>(
        &self,
        table: &str,
        payload: &P,
        extra: Row,
    ) -> Result<T, DatastoreError>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let mut row = to_row(payload)?;
        for (key, value) in extra {
            row.insert(key, value);
        }
        let stamp = Self::now_stamp();
        row.insert("created_at".to_string(), json!(stamp));
        row.insert("updated_at".to_string(), json!(stamp));
        let persisted = self.service.insert_row(table, row).await?;
        from_row(persisted)
    }

    /// Apply a patch with a fresh `updated_at`, returning the first mutated
    /// row if any matched.
    pub(crate) async fn stamped_update<T: DeserializeOwned>(
        &self,
        table: &str,
        mut patch: Row,
        filter: &Filter,
    ) -> Result<Option<T>, DatastoreError> {
        patch.insert("updated_at".to_string(), json!(Self::now_stamp()));
        let rows = self.service.update::<T>(table, patch, filter).await?;
        Ok(rows.into_iter().next())
    }

    pub(crate) async fn find_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &RecordId,
    ) -> Result<Option<T>, DatastoreError> {
        let options = SelectOptions::new().filter(Filter::new().eq("id", id.to_json()));
        self.service.select_one(table, options).await
    }

    /// Read one site configuration value by key.
    pub async fn get_config(&self, key: &str) -> Result<Option<JsonValue>, DatastoreError> {
        let options = SelectOptions::new().filter(Filter::new().eq("config_key", key));
        let rows = self
            .service
            .select_rows(tables::SITE_CONFIG, &options.limit(1))
            .await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("config_value")))
    }

    /// Write one site configuration value, inserting the key on first use.
    pub async fn set_config(&self, key: &str, value: JsonValue) -> Result<(), DatastoreError> {
        let filter = Filter::new().eq("config_key", key);
        let mut patch = Row::new();
        patch.insert("config_value".to_string(), value.clone());
        patch.insert("updated_at".to_string(), json!(Self::now_stamp()));
        let updated = self
            .service
            .update_rows(tables::SITE_CONFIG, patch, &filter)
            .await?;
        if updated.is_empty() {
            let stamp = Self::now_stamp();
            let mut row = Row::new();
            row.insert("config_key".to_string(), json!(key));
            row.insert("config_value".to_string(), value);
            row.insert("created_at".to_string(), json!(stamp));
            row.insert("updated_at".to_string(), json!(stamp));
            self.service.insert_row(tables::SITE_CONFIG, row).await?;
        }
        Ok(())
    }

    /// Append one analytics row through the generic insert path.
    pub async fn track_event(
        &self,
        event_name: &str,
        payload: JsonValue,
        user_id: Option<&RecordId>,
    ) -> Result<(), DatastoreError> {
        let mut row = Row::new();
        row.insert("event_name".to_string(), json!(event_name));
        row.insert("payload".to_string(), payload);
        if let Some(user_id) = user_id {
            row.insert("user_id".to_string(), user_id.to_json());
        }
        row.insert("created_at".to_string(), json!(Self::now_stamp()));
        self.service.insert_row(tables::ANALYTICS, row).await?;
        Ok(())
    }

    /// Store a media object and return its public URL.
    pub async fn upload_media(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DatastoreError> {
        self.service
            .upload_file(MEDIA_BUCKET, path, content_type, bytes)
            .await
    }

    pub async fn delete_media(&self, path: &str) -> Result<(), DatastoreError> {
        self.service.delete_file(MEDIA_BUCKET, path).await
    }

    #[must_use]
    pub fn media_url(&self, path: &str) -> String {
        self.service.file_url(MEDIA_BUCKET, path)
    }
}
