//! Contract properties exercised against the in-memory backend, which
//! models the filter, pagination, and result semantics both real adapters
//! translate.

use atlas_datastore::prelude::*;
use atlas_datastore::test_utils::MemoryBackend;
use serde_json::json;

fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn people_fixture() -> Vec<Row> {
    vec![
        row(&[("name", json!("amita")), ("age", json!(17))]),
        row(&[("name", json!("bea")), ("age", json!(18))]),
        row(&[("name", json!("chand")), ("age", json!(42))]),
        row(&[("name", json!("dilip")), ("age", json!(30))]),
    ]
}

#[tokio::test]
async fn range_filter_includes_the_boundary() {
    let backend = MemoryBackend::new();
    backend.seed("people", people_fixture());

    let options = SelectOptions::new().filter(Filter::new().gte("age", 18)).order_by("age");
    let rows = backend.select_rows("people", &options).await.unwrap();
    let ages: Vec<i64> = rows.iter().map(|r| r["age"].as_i64().unwrap()).collect();
    assert_eq!(ages, vec![18, 30, 42]);
}

#[tokio::test]
async fn where_map_and_builder_agree() {
    let backend = MemoryBackend::new();
    backend.seed("people", people_fixture());

    let map = json!({"age": {"gte": 18, "lte": 30}});
    let from_map = Filter::from_where_map(map.as_object().unwrap()).unwrap();
    let built = Filter::new().gte("age", 18).lte("age", 30);

    let via_map = backend
        .select_rows("people", &SelectOptions::new().filter(from_map).order_by("name"))
        .await
        .unwrap();
    let via_builder = backend
        .select_rows("people", &SelectOptions::new().filter(built).order_by("name"))
        .await
        .unwrap();
    assert_eq!(via_map, via_builder);
    assert_eq!(via_map.len(), 2);
}

#[tokio::test]
async fn empty_filter_matches_everything() {
    let backend = MemoryBackend::new();
    backend.seed("people", people_fixture());

    let rows = backend
        .select_rows("people", &SelectOptions::new())
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
}

#[tokio::test]
async fn empty_membership_matches_nothing() {
    let backend = MemoryBackend::new();
    backend.seed("people", people_fixture());

    let options = SelectOptions::new().filter(Filter::new().is_in("age", Vec::<i64>::new()));
    let rows = backend.select_rows("people", &options).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn pagination_is_stable_across_calls() {
    let backend = MemoryBackend::new();
    let fixture: Vec<Row> = (0..30)
        .map(|i| row(&[("seq", json!(i)), ("label", json!(format!("row-{i}")))]))
        .collect();
    backend.seed("items", fixture);

    let options = SelectOptions::new().order_by("seq").limit(10).offset(20);
    let first = backend.select_rows("items", &options).await.unwrap();
    let second = backend.select_rows("items", &options).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 10);
    assert_eq!(first[0]["seq"], json!(20));
    assert_eq!(first[9]["seq"], json!(29));
}

#[tokio::test]
async fn update_returns_exactly_the_mutated_rows() {
    let backend = MemoryBackend::new();
    let inserted = backend
        .insert_row("bookings", row(&[("status", json!("pending"))]))
        .await
        .unwrap();
    backend
        .insert_row("bookings", row(&[("status", json!("pending"))]))
        .await
        .unwrap();

    let patch = row(&[("status", json!("confirmed"))]);
    let filter = Filter::new().eq("id", inserted["id"].clone());
    let updated = backend.update_rows("bookings", patch, &filter).await.unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0]["status"], json!("confirmed"));
    assert_eq!(updated[0]["id"], inserted["id"]);
}

#[tokio::test]
async fn no_match_delete_is_zero_not_an_error() {
    let backend = MemoryBackend::new();
    backend.seed("people", people_fixture());

    let filter = Filter::new().eq("name", "does-not-exist");
    let removed = backend.delete_rows("people", &filter).await.unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn empty_filter_delete_removes_every_row() {
    let backend = MemoryBackend::new();
    backend.seed("people", people_fixture());

    let removed = backend.delete_rows("people", &Filter::new()).await.unwrap();
    assert_eq!(removed, 4);
    let rows = backend
        .select_rows("people", &SelectOptions::new())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn failures_are_values_not_panics() {
    let backend = MemoryBackend::new();
    backend.seed("people", people_fixture());
    backend.set_failing(true);

    let select = backend.select_rows("people", &SelectOptions::new()).await;
    assert!(select.as_ref().unwrap_err().is_connection());

    let insert = backend.insert_row("people", Row::new()).await;
    assert!(insert.as_ref().unwrap_err().is_connection());

    let update = backend
        .update_rows("people", Row::new(), &Filter::new())
        .await;
    assert!(update.as_ref().unwrap_err().is_connection());

    let delete = backend.delete_rows("people", &Filter::new()).await;
    assert!(delete.as_ref().unwrap_err().is_connection());

    let raw = backend.raw_query("sp_anything", &[]).await;
    assert!(raw.as_ref().unwrap_err().is_connection());

    let upload = backend.upload_file("media", "a.jpg", "image/jpeg", vec![1]).await;
    assert!(upload.as_ref().unwrap_err().is_connection());

    backend.set_failing(false);
    let recovered = backend.select_rows("people", &SelectOptions::new()).await;
    assert_eq!(recovered.unwrap().len(), 4);
}

#[tokio::test]
async fn unknown_operator_is_a_translation_error() {
    let map = json!({"age": {"between": [1, 2]}});
    let err = Filter::from_where_map(map.as_object().unwrap()).unwrap_err();
    assert!(err.is_translation());
}
