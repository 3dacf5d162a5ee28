use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use shared::domain::RecordId;
use uuid::Uuid;

use crate::{Document, DocumentStore, StoreError};

/// Process-local store keeping every inserted document in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<(RecordId, Document)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection; empty when nothing was ever written to it.
    pub fn documents(&self, collection: &str) -> Vec<(RecordId, Document)> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .all(Vec::is_empty)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<RecordId, StoreError> {
        let id = RecordId(Uuid::new_v4().simple().to_string());
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), document));
        Ok(id)
    }
}
