use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::Value;
use shared::{
    domain::{ContactSubmission, RecordId, TodoItem},
    error::{ApiError, ErrorCode},
};
use storage::{Document, DocumentStore, StoreError};
use tracing::{info, warn};

pub mod fields;

use fields::{
    decode_json, decode_json_or_form, Payload, CONTACT_EMAIL, CONTACT_MESSAGE, CONTACT_NAME,
    TODO_DESCRIPTION, TODO_NAME,
};

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON payload";
pub const CONTACT_REQUIRED_MESSAGE: &str = "Name and email are required";
pub const TODO_REQUIRED_MESSAGE: &str = "itemName is required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub submissions: String,
    pub todos: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            submissions: "submissions".into(),
            todos: "todos".into(),
        }
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn DocumentStore>,
    pub collections: Collections,
    pub feed_path: PathBuf,
}

/// Reads the feed document from disk. A mapping is flattened to its values
/// in document order; every other JSON value is returned as-is.
pub async fn load_feed(ctx: &ApiContext) -> Result<Value, ApiError> {
    let name = feed_name(&ctx.feed_path);
    let raw = tokio::fs::read_to_string(&ctx.feed_path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ApiError::new(ErrorCode::FeedMissing, format!("{name} not found")),
            _ => ApiError::internal(e.to_string()),
        })?;

    let document: Value = serde_json::from_str(&raw).map_err(|_| {
        ApiError::new(ErrorCode::InvalidFeed, format!("{name} is not valid JSON"))
    })?;

    Ok(project_feed(document))
}

pub fn project_feed(document: Value) -> Value {
    match document {
        Value::Object(map) => Value::Array(map.into_iter().map(|(_, value)| value).collect()),
        other => other,
    }
}

fn feed_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn validate_contact(payload: &Payload) -> Result<ContactSubmission, ApiError> {
    let name = CONTACT_NAME.resolve(payload);
    let email = CONTACT_EMAIL.resolve(payload);
    let message = CONTACT_MESSAGE.resolve(payload);

    if name.is_empty() || email.is_empty() {
        return Err(ApiError::validation(CONTACT_REQUIRED_MESSAGE));
    }
    Ok(ContactSubmission {
        name,
        email,
        message,
    })
}

pub fn validate_todo(payload: &Payload) -> Result<TodoItem, ApiError> {
    let item_name = TODO_NAME.resolve(payload);
    let item_description = TODO_DESCRIPTION.resolve(payload);

    if item_name.is_empty() {
        return Err(ApiError::validation(TODO_REQUIRED_MESSAGE));
    }
    Ok(TodoItem {
        item_name,
        item_description,
    })
}

/// Contact form: the body must be a non-empty JSON object.
pub async fn submit_contact(ctx: &ApiContext, body: &[u8]) -> Result<RecordId, ApiError> {
    let payload = decode_json(body).ok_or_else(|| ApiError::validation(INVALID_JSON_MESSAGE))?;
    let submission = validate_contact(&payload)?;

    let id = insert(ctx, &ctx.collections.submissions, &submission).await?;
    info!(%id, collection = %ctx.collections.submissions, "contact submission stored");
    Ok(id)
}

/// Todo form: JSON when typed as JSON, url-encoded form fields otherwise.
pub async fn submit_todo(
    ctx: &ApiContext,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<RecordId, ApiError> {
    submit_todo_fields(ctx, decode_json_or_form(content_type, body)).await
}

/// Todo form whose fields were already decoded by the transport, as with
/// multipart bodies.
pub async fn submit_todo_fields(ctx: &ApiContext, payload: Payload) -> Result<RecordId, ApiError> {
    let item = validate_todo(&payload)?;

    let id = insert(ctx, &ctx.collections.todos, &item).await?;
    info!(%id, collection = %ctx.collections.todos, "todo item stored");
    Ok(id)
}

async fn insert<T: serde::Serialize>(
    ctx: &ApiContext,
    collection: &str,
    record: &T,
) -> Result<RecordId, ApiError> {
    let document = to_document(record)?;
    ctx.store
        .insert_one(collection, document)
        .await
        .map_err(|e| {
            warn!(collection, error = %e, "insert failed");
            store_error(e)
        })
}

fn to_document<T: serde::Serialize>(record: &T) -> Result<Document, ApiError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::internal("record did not serialize to an object")),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotConfigured(message) => ApiError::new(ErrorCode::Configuration, message),
        StoreError::Backend(message) => ApiError::internal(message),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
