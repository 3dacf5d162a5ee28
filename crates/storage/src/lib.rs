//! Append-only document persistence behind the form gateway.
//!
//! Handlers only ever need one operation: insert a flat document into a named
//! collection and learn the identifier the store assigned. [`DocumentStore`]
//! captures exactly that so the HTTP layer can run against MongoDB in
//! production and [`MemoryStore`] in tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::domain::RecordId;
use thiserror::Error;

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::{MongoStore, MISSING_URI_MESSAGE};

/// A flat, schema-less record as it is written to a collection.
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached because it was never configured.
    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, collection: &str, document: Document)
        -> Result<RecordId, StoreError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
