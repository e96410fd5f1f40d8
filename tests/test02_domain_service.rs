//! Domain layer over the facade: stamping, guarded transitions, absence
//! semantics, analytics, config, and media.

use std::sync::Arc;
use std::time::Duration;

use atlas_datastore::domain::tables;
use atlas_datastore::prelude::*;
use atlas_datastore::test_utils::MemoryBackend;
use serde_json::json;

async fn domain() -> DomainData {
    let backend = Arc::new(MemoryBackend::new());
    let service = BackendService::with_memory(backend).await.unwrap();
    DomainData::new(Arc::new(service))
}

fn test_stay(vendor: i64) -> NewService {
    NewService {
        vendor_id: RecordId::from(vendor),
        category_id: None,
        location_id: None,
        name: "Test Stay".to_string(),
        description: Some("Lakeside homestay".to_string()),
        kind: ServiceKind::Homestay,
        base_price: 1500.0,
        images: None,
    }
}

#[tokio::test]
async fn insert_then_approve_round_trip() {
    let data = domain().await;

    let service = data.create_service(test_stay(9)).await.unwrap();
    assert!(service.id.as_i64().is_some(), "expected a generated id");
    assert_eq!(service.base_price, 1500.0);
    assert_eq!(service.status, ListingStatus::Pending);
    let created_at = service.created_at;

    tokio::time::sleep(Duration::from_millis(5)).await;

    let approved = data
        .approve_service(&service.id)
        .await
        .unwrap()
        .expect("service should still exist");
    assert_eq!(approved.status, ListingStatus::Approved);
    assert!(approved.approved_at.is_some());
    assert!(
        approved.updated_at > created_at,
        "updated_at must move past created_at"
    );
    assert_eq!(approved.created_at, created_at);
}

#[tokio::test]
async fn booking_confirm_and_cancel_transitions() {
    let data = domain().await;
    let stay = data.create_service(test_stay(3)).await.unwrap();

    let booking = data
        .create_booking(NewBooking {
            user_id: RecordId::from(11),
            service_id: stay.id.clone(),
            booking_date: "2026-09-01".parse().unwrap(),
            guests: 2,
            total_amount: 3000.0,
        })
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
    assert!(booking.confirmed_at.is_none());

    let confirmed = data
        .confirm_booking(&booking.id)
        .await
        .unwrap()
        .expect("booking exists");
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());

    let paid = data
        .mark_booking_paid(&booking.id, "gw-20260901-0042")
        .await
        .unwrap()
        .expect("booking exists");
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.payment_reference.as_deref(), Some("gw-20260901-0042"));

    let cancelled = data
        .cancel_booking(&booking.id, "weather warning", "vendor:3")
        .await
        .unwrap()
        .expect("booking exists");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("weather warning"));
    assert_eq!(cancelled.cancelled_by.as_deref(), Some("vendor:3"));
    assert!(cancelled.cancelled_at.is_some());
}

#[tokio::test]
async fn absence_is_none_not_an_error() {
    let data = domain().await;
    let missing = data.get_user_by_id(&RecordId::from(404)).await.unwrap();
    assert!(missing.is_none());

    let missing = data
        .confirm_booking(&RecordId::from("no-such-booking"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn listings_filter_by_status_and_kind() {
    let data = domain().await;
    let a = data.create_service(test_stay(1)).await.unwrap();
    let _b = data.create_service(test_stay(2)).await.unwrap();
    data.approve_service(&a.id).await.unwrap();

    let approved = data
        .list_services(&ServiceQuery::new().status(ListingStatus::Approved))
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, a.id);

    let drivers = data
        .list_services(&ServiceQuery::new().kind(ServiceKind::Driver))
        .await
        .unwrap();
    assert!(drivers.is_empty());
}

#[tokio::test]
async fn users_create_and_lookup() {
    let data = domain().await;
    let user = data
        .create_user(NewUser {
            email: "guest@example.com".to_string(),
            full_name: Some("Guest One".to_string()),
            phone: None,
            role: Some("traveller".to_string()),
        })
        .await
        .unwrap();

    let by_email = data
        .get_user_by_email("guest@example.com")
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(by_email.id, user.id);

    let patched = data
        .update_user(&user.id, [("phone".to_string(), json!("+9771234"))].into_iter().collect())
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(patched.phone.as_deref(), Some("+9771234"));
}

#[tokio::test]
async fn site_config_upserts() {
    let data = domain().await;
    assert!(data.get_config("homepage_banner").await.unwrap().is_none());

    data.set_config("homepage_banner", json!({"title": "Monsoon deals"}))
        .await
        .unwrap();
    assert_eq!(
        data.get_config("homepage_banner").await.unwrap(),
        Some(json!({"title": "Monsoon deals"}))
    );

    data.set_config("homepage_banner", json!({"title": "Winter deals"}))
        .await
        .unwrap();
    assert_eq!(
        data.get_config("homepage_banner").await.unwrap(),
        Some(json!({"title": "Winter deals"}))
    );
}

#[tokio::test]
async fn analytics_rows_are_append_only_inserts() {
    let data = domain().await;
    data.track_event("listing_viewed", json!({"service": 7}), Some(&RecordId::from(2)))
        .await
        .unwrap();
    data.track_event("checkout_started", json!({"total": 3000}), None)
        .await
        .unwrap();

    let rows = data
        .backend()
        .select_rows(tables::ANALYTICS, &SelectOptions::new())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["event_name"], json!("listing_viewed"));
    assert!(rows[0].contains_key("created_at"));
}

#[tokio::test]
async fn media_round_trip_through_the_facade() {
    let data = domain().await;
    let url = data
        .upload_media("stays/7/cover.jpg", "image/jpeg", vec![0xFF, 0xD8])
        .await
        .unwrap();
    assert_eq!(url, "memory://media/stays/7/cover.jpg");
    assert_eq!(data.media_url("stays/7/cover.jpg"), url);
    data.delete_media("stays/7/cover.jpg").await.unwrap();
}

#[tokio::test]
async fn facade_reports_kind_and_connection_state() {
    let data = domain().await;
    let status = data.backend().status();
    assert_eq!(status.kind, BackendKind::Memory);
    assert!(status.connected);
    assert!(!data.backend().supports_atomic_transactions());

    data.backend().shutdown().await;
    assert!(!data.backend().is_connected());
}
