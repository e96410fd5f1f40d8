//! Marketplace entities as both backends persist them.
//!
//! Timestamp columns go through the tolerant serde adapters so rows decode
//! whether they came back from the platform (RFC 3339 with offset) or from
//! SQL Server (naive datetime2 text).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::{RecordId, datetime_compat, datetime_compat_opt};

/// Listing lifecycle shared by services and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl From<ListingStatus> for JsonValue {
    fn from(status: ListingStatus) -> Self {
        JsonValue::from(status.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl From<BookingStatus> for JsonValue {
    fn from(status: BookingStatus) -> Self {
        JsonValue::from(status.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

impl From<PaymentStatus> for JsonValue {
    fn from(status: PaymentStatus) -> Self {
        JsonValue::from(status.as_str())
    }
}

/// What kind of bookable service a vendor lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Homestay,
    Restaurant,
    Driver,
    Event,
}

impl ServiceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Homestay => "homestay",
            Self::Restaurant => "restaurant",
            Self::Driver => "driver",
            Self::Event => "event",
        }
    }
}

impl From<ServiceKind> for JsonValue {
    fn from(kind: ServiceKind) -> Self {
        JsonValue::from(kind.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(with = "datetime_compat")]
    pub created_at: NaiveDateTime,
    #[serde(with = "datetime_compat")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    pub vendor_id: RecordId,
    #[serde(default)]
    pub category_id: Option<RecordId>,
    #[serde(default)]
    pub location_id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "service_type")]
    pub kind: ServiceKind,
    pub base_price: f64,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    pub status: ListingStatus,
    #[serde(default, with = "datetime_compat_opt")]
    pub approved_at: Option<NaiveDateTime>,
    #[serde(with = "datetime_compat")]
    pub created_at: NaiveDateTime,
    #[serde(with = "datetime_compat")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewService {
    pub vendor_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<RecordId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "service_type")]
    pub kind: ServiceKind,
    pub base_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: RecordId,
    pub user_id: RecordId,
    pub service_id: RecordId,
    pub booking_date: NaiveDate,
    pub guests: u32,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default, with = "datetime_compat_opt")]
    pub confirmed_at: Option<NaiveDateTime>,
    #[serde(default, with = "datetime_compat_opt")]
    pub cancelled_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub cancelled_by: Option<String>,
    #[serde(with = "datetime_compat")]
    pub created_at: NaiveDateTime,
    #[serde(with = "datetime_compat")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub user_id: RecordId,
    pub service_id: RecordId,
    pub booking_date: NaiveDate,
    pub guests: u32,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub location_id: Option<RecordId>,
    #[serde(with = "datetime_compat")]
    pub starts_at: NaiveDateTime,
    #[serde(default, with = "datetime_compat_opt")]
    pub ends_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub ticket_price: Option<f64>,
    #[serde(default)]
    pub capacity: Option<u32>,
    pub status: ListingStatus,
    #[serde(default, with = "datetime_compat_opt")]
    pub approved_at: Option<NaiveDateTime>,
    #[serde(with = "datetime_compat")]
    pub created_at: NaiveDateTime,
    #[serde(with = "datetime_compat")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<RecordId>,
    #[serde(with = "datetime_compat")]
    pub starts_at: NaiveDateTime,
    #[serde(with = "datetime_compat_opt", skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Typed query surface for service listings.
#[derive(Debug, Clone, Default)]
pub struct ServiceQuery {
    pub category_id: Option<RecordId>,
    pub location_id: Option<RecordId>,
    pub kind: Option<ServiceKind>,
    pub status: Option<ListingStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ServiceQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, id: RecordId) -> Self {
        self.category_id = Some(id);
        self
    }

    #[must_use]
    pub fn location(mut self, id: RecordId) -> Self {
        self.location_id = Some(id);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ServiceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn status(mut self, status: ListingStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn page(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}
