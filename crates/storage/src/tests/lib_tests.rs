use super::*;
use serde_json::json;

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn memory_store_appends_documents_per_collection() {
    let store = MemoryStore::new();
    let first = store
        .insert_one("submissions", doc(json!({ "name": "Ada" })))
        .await
        .expect("insert");
    let second = store
        .insert_one("submissions", doc(json!({ "name": "Grace" })))
        .await
        .expect("insert");
    store
        .insert_one("todos", doc(json!({ "itemName": "milk" })))
        .await
        .expect("insert");

    assert_ne!(first, second);
    assert!(!first.as_str().is_empty());

    let submissions = store.documents("submissions");
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].0, first);
    assert_eq!(submissions[1].1["name"], "Grace");
    assert_eq!(store.len("todos"), 1);
    assert_eq!(store.len("missing"), 0);
}

#[tokio::test]
async fn memory_store_starts_empty() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    assert!(store.documents("submissions").is_empty());
}

#[tokio::test]
async fn mongo_store_without_uri_reports_configuration_error() {
    let store = MongoStore::new(None, "flask_form_db");
    assert!(!store.is_configured());

    let err = store
        .insert_one("submissions", doc(json!({ "name": "Ada" })))
        .await
        .expect_err("should fail");
    assert!(matches!(err, StoreError::NotConfigured(_)));
    assert_eq!(err.to_string(), MISSING_URI_MESSAGE);
    assert!(!store.is_connected());
}

#[tokio::test]
async fn blank_mongo_uri_counts_as_unset() {
    let store = MongoStore::new(Some("   ".to_string()), "flask_form_db");
    assert!(!store.is_configured());
}

#[tokio::test]
async fn malformed_mongo_uri_is_a_backend_error() {
    let store = MongoStore::new(Some("not-a-mongo-uri".to_string()), "flask_form_db");
    let err = store
        .insert_one("todos", doc(json!({ "itemName": "milk" })))
        .await
        .expect_err("should fail");
    assert!(matches!(err, StoreError::Backend(_)));
    assert!(!store.is_connected());
}
