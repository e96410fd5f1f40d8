//! Booking lifecycle, including the transitions the payment-verification
//! collaborator persists through this layer.

use serde_json::json;

use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::types::{RecordId, Row};

use super::entities::{Booking, BookingStatus, NewBooking, PaymentStatus};
use super::{DomainData, tables};

impl DomainData {
    /// New bookings start pending and unpaid.
    pub async fn create_booking(&self, booking: NewBooking) -> Result<Booking, DatastoreError> {
        let mut extra = Row::new();
        extra.insert("status".to_string(), BookingStatus::Pending.into());
        extra.insert("payment_status".to_string(), PaymentStatus::Unpaid.into());
        self.stamped_insert(tables::BOOKINGS, &booking, extra).await
    }

    pub async fn get_booking_by_id(
        &self,
        id: &RecordId,
    ) -> Result<Option<Booking>, DatastoreError> {
        self.find_by_id(tables::BOOKINGS, id).await
    }

    pub async fn bookings_for_user(
        &self,
        user_id: &RecordId,
    ) -> Result<Vec<Booking>, DatastoreError> {
        let options = SelectOptions::new()
            .filter(Filter::new().eq("user_id", user_id.to_json()))
            .order_by("created_at desc");
        self.backend().select(tables::BOOKINGS, &options).await
    }

    pub async fn bookings_for_service(
        &self,
        service_id: &RecordId,
    ) -> Result<Vec<Booking>, DatastoreError> {
        let options = SelectOptions::new()
            .filter(Filter::new().eq("service_id", service_id.to_json()))
            .order_by("booking_date");
        self.backend().select(tables::BOOKINGS, &options).await
    }

    pub async fn update_booking(
        &self,
        id: &RecordId,
        patch: Row,
    ) -> Result<Option<Booking>, DatastoreError> {
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::BOOKINGS, patch, &filter).await
    }

    /// Confirmation sets the status and `confirmed_at` in one update call.
    pub async fn confirm_booking(&self, id: &RecordId) -> Result<Option<Booking>, DatastoreError> {
        let mut patch = Row::new();
        patch.insert("status".to_string(), BookingStatus::Confirmed.into());
        patch.insert("confirmed_at".to_string(), json!(Self::now_stamp()));
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::BOOKINGS, patch, &filter).await
    }

    /// Cancellation records who cancelled and why alongside the status.
    pub async fn cancel_booking(
        &self,
        id: &RecordId,
        reason: &str,
        cancelled_by: &str,
    ) -> Result<Option<Booking>, DatastoreError> {
        let mut patch = Row::new();
        patch.insert("status".to_string(), BookingStatus::Cancelled.into());
        patch.insert("cancellation_reason".to_string(), json!(reason));
        patch.insert("cancelled_by".to_string(), json!(cancelled_by));
        patch.insert("cancelled_at".to_string(), json!(Self::now_stamp()));
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::BOOKINGS, patch, &filter).await
    }

    /// Payment verification landed: record the gateway reference.
    pub async fn mark_booking_paid(
        &self,
        id: &RecordId,
        payment_reference: &str,
    ) -> Result<Option<Booking>, DatastoreError> {
        let mut patch = Row::new();
        patch.insert("payment_status".to_string(), PaymentStatus::Paid.into());
        patch.insert("payment_reference".to_string(), json!(payment_reference));
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::BOOKINGS, patch, &filter).await
    }
}
