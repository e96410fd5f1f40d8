//! Services, events, categories, and locations.

use serde_json::json;

use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::types::{RecordId, Row};

use super::entities::{
    Category, Event, ListingStatus, Location, NewEvent, NewService, Service, ServiceQuery,
};
use super::{DomainData, tables};

impl DomainData {
    pub async fn list_services(&self, query: &ServiceQuery) -> Result<Vec<Service>, DatastoreError> {
        let mut filter = Filter::new();
        if let Some(category_id) = &query.category_id {
            filter = filter.eq("category_id", category_id.to_json());
        }
        if let Some(location_id) = &query.location_id {
            filter = filter.eq("location_id", location_id.to_json());
        }
        if let Some(kind) = query.kind {
            filter = filter.eq("service_type", kind);
        }
        if let Some(status) = query.status {
            filter = filter.eq("status", status);
        }
        let mut options = SelectOptions::new().filter(filter).order_by("created_at desc");
        if let Some(limit) = query.limit {
            options = options.limit(limit);
        }
        if let Some(offset) = query.offset {
            options = options.offset(offset);
        }
        self.backend().select(tables::SERVICES, &options).await
    }

    pub async fn get_service_by_id(
        &self,
        id: &RecordId,
    ) -> Result<Option<Service>, DatastoreError> {
        self.find_by_id(tables::SERVICES, id).await
    }

    /// New listings start pending until an operator approves them.
    pub async fn create_service(&self, service: NewService) -> Result<Service, DatastoreError> {
        let mut extra = Row::new();
        extra.insert("status".to_string(), ListingStatus::Pending.into());
        self.stamped_insert(tables::SERVICES, &service, extra).await
    }

    pub async fn update_service(
        &self,
        id: &RecordId,
        patch: Row,
    ) -> Result<Option<Service>, DatastoreError> {
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::SERVICES, patch, &filter).await
    }

    /// Operator approval: status and `approved_at` land in one update.
    pub async fn approve_service(&self, id: &RecordId) -> Result<Option<Service>, DatastoreError> {
        let mut patch = Row::new();
        patch.insert("status".to_string(), ListingStatus::Approved.into());
        patch.insert("approved_at".to_string(), json!(Self::now_stamp()));
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::SERVICES, patch, &filter).await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, DatastoreError> {
        let options = SelectOptions::new().order_by("starts_at");
        self.backend().select(tables::EVENTS, &options).await
    }

    pub async fn get_event_by_id(&self, id: &RecordId) -> Result<Option<Event>, DatastoreError> {
        self.find_by_id(tables::EVENTS, id).await
    }

    pub async fn create_event(&self, event: NewEvent) -> Result<Event, DatastoreError> {
        let mut extra = Row::new();
        extra.insert("status".to_string(), ListingStatus::Pending.into());
        self.stamped_insert(tables::EVENTS, &event, extra).await
    }

    pub async fn approve_event(&self, id: &RecordId) -> Result<Option<Event>, DatastoreError> {
        let mut patch = Row::new();
        patch.insert("status".to_string(), ListingStatus::Approved.into());
        patch.insert("approved_at".to_string(), json!(Self::now_stamp()));
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::EVENTS, patch, &filter).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DatastoreError> {
        let options = SelectOptions::new().order_by("name");
        self.backend().select(tables::CATEGORIES, &options).await
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, DatastoreError> {
        let options = SelectOptions::new().order_by("name");
        self.backend().select(tables::LOCATIONS, &options).await
    }
}
