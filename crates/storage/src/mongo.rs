use async_trait::async_trait;
use mongodb::{
    bson::{self, Bson},
    Client, Database,
};
use shared::domain::RecordId;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{Document, DocumentStore, StoreError};

pub const MISSING_URI_MESSAGE: &str = "MONGODB_URI is not set";

/// MongoDB-backed store. The client is built on the first insert and reused
/// for the rest of the process.
pub struct MongoStore {
    uri: Option<String>,
    database: String,
    client: OnceCell<Client>,
}

impl MongoStore {
    pub fn new(uri: Option<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.filter(|uri| !uri.trim().is_empty()),
            database: database.into(),
            client: OnceCell::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.uri.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    async fn database(&self) -> Result<Database, StoreError> {
        let uri = self
            .uri
            .as_deref()
            .ok_or_else(|| StoreError::NotConfigured(MISSING_URI_MESSAGE.to_string()))?;

        let client = self
            .client
            .get_or_try_init(|| async move {
                let client = Client::with_uri_str(uri)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                info!(database = %self.database, "mongodb client initialized");
                Ok::<_, StoreError>(client)
            })
            .await?;

        Ok(client.database(&self.database))
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<RecordId, StoreError> {
        let database = self.database().await?;
        let document =
            bson::to_document(&document).map_err(|e| StoreError::Backend(e.to_string()))?;

        let result = database
            .collection::<bson::Document>(collection)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s,
            other => other.to_string(),
        };
        debug!(collection, %id, "document inserted");
        Ok(RecordId(id))
    }
}
