//! Document store abstraction, connection pool and migration utilities.
//!
//! Every entity lives as a JSON document inside a named collection. Services
//! talk to the [`DocumentStore`] trait so that the PostgreSQL backend and the
//! in-memory backend used by tests are interchangeable.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::errors::AppError;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Collection names shared by services and the seed binary.
pub mod collections {
    pub const USERS: &str = "users";
    pub const THERAPISTS: &str = "therapists";
    pub const BOOKINGS: &str = "bookings";
    pub const ORDERS: &str = "orders";
    pub const PRODUCTS: &str = "products";
    pub const ADMINS: &str = "admins";
    pub const AUTH_ACCOUNTS: &str = "auth_accounts";
}

/// A stored document: its id within the collection plus the JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Decode the payload into a typed record, injecting the document id
    /// under `id_field` when the payload does not carry a usable one.
    pub fn decode<T: DeserializeOwned>(&self, id_field: &str) -> Result<T, serde_json::Error> {
        let mut data = match &self.data {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let carries_id = matches!(data.get(id_field), Some(Value::String(s)) if !s.is_empty());
        if !carries_id {
            data.insert(id_field.to_string(), Value::String(self.id.clone()));
        }
        serde_json::from_value(Value::Object(data))
    }
}

/// Read/write capability set over named document collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`, in insertion order.
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, AppError>;

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// Documents whose top-level `field` equals `value`.
    async fn list_where(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, AppError>;

    /// Insert a document under a freshly generated id.
    async fn insert(&self, collection: &str, data: Value) -> Result<Document, AppError>;

    /// Create or fully replace the document with the given id.
    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), AppError>;

    /// Shallow-merge `fields` into an existing document.
    /// Fails with `NotFound` when the document does not exist.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, AppError>;

    /// Delete a document, returning whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError>;

    /// Connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Generate a new document id (time-ordered, hyphen-free).
pub fn new_document_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Apply embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    #[test]
    fn decode_injects_document_id() {
        let doc = Document::new("abc", json!({ "name": "Calm" }));
        let named: Named = doc.decode("id").unwrap();
        assert_eq!(named.id, "abc");
        assert_eq!(named.name, "Calm");
    }

    #[test]
    fn decode_keeps_payload_id() {
        let doc = Document::new("abc", json!({ "id": "inner", "name": "Calm" }));
        let named: Named = doc.decode("id").unwrap();
        assert_eq!(named.id, "inner");
    }

    #[test]
    fn decode_replaces_unusable_payload_id() {
        for bad in [json!(null), json!(""), json!(17)] {
            let doc = Document::new("abc", json!({ "id": bad, "name": "Calm" }));
            let named: Named = doc.decode("id").unwrap();
            assert_eq!(named.id, "abc");
        }
    }

    #[test]
    fn document_ids_are_unique() {
        assert_ne!(new_document_id(), new_document_id());
    }
}
