//! Transaction callback semantics at the facade: commit on success, error
//! re-raised unchanged on failure, nested calls flattened onto the same
//! context.

use std::sync::Arc;

use atlas_datastore::prelude::*;
use atlas_datastore::test_utils::MemoryBackend;
use serde_json::json;

async fn facade() -> BackendService {
    BackendService::with_memory(Arc::new(MemoryBackend::new()))
        .await
        .unwrap()
}

fn note(text: &str) -> Row {
    [("note".to_string(), json!(text))].into_iter().collect()
}

#[tokio::test]
async fn callback_result_is_returned_after_commit() {
    let service = facade().await;

    let id = service
        .transaction(|ctx| {
            Box::pin(async move {
                let row = ctx.insert_row("journal", note("first")).await?;
                Ok(row["id"].clone())
            })
        })
        .await
        .unwrap();

    let rows = service.select_rows("journal", &SelectOptions::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id);
}

#[tokio::test]
async fn callback_error_is_reraised_unchanged() {
    let service = facade().await;

    let result: Result<(), DatastoreError> = service
        .transaction(|ctx| {
            Box::pin(async move {
                ctx.insert_row("journal", note("doomed")).await?;
                Err(DatastoreError::Backend("constraint violated".to_string()))
            })
        })
        .await;

    match result {
        Err(DatastoreError::Backend(message)) => assert_eq!(message, "constraint violated"),
        other => panic!("expected the callback error back, got {other:?}"),
    }

    // This backend reports no atomicity, and indeed the write survives the
    // failed callback; callers must consult the capability flag.
    assert!(!service.supports_atomic_transactions());
    let rows = service.select_rows("journal", &SelectOptions::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn nested_transactions_flatten_onto_one_context() {
    let service = facade().await;

    service
        .transaction(|ctx| {
            Box::pin(async move {
                ctx.insert_row("journal", note("outer")).await?;
                ctx.transaction(|inner| {
                    Box::pin(async move {
                        inner.insert_row("journal", note("inner")).await?;
                        Ok(())
                    })
                })
                .await?;
                ctx.insert_row("journal", note("outer-again")).await?;
                Ok(())
            })
        })
        .await
        .unwrap();

    let rows = service.select_rows("journal", &SelectOptions::new()).await.unwrap();
    let notes: Vec<&str> = rows.iter().map(|r| r["note"].as_str().unwrap()).collect();
    assert_eq!(notes, vec!["outer", "inner", "outer-again"]);
}

#[tokio::test]
async fn context_reads_its_own_writes() {
    let service = facade().await;

    let seen_inside = service
        .transaction(|ctx| {
            Box::pin(async move {
                ctx.insert_row("journal", note("visible")).await?;
                let rows = ctx.select_rows("journal", &SelectOptions::new()).await?;
                Ok(rows.len())
            })
        })
        .await
        .unwrap();
    assert_eq!(seen_inside, 1);
}
