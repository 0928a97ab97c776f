//! Document store en memoria
//!
//! Backend para tests y para correr el servidor sin PostgreSQL
//! (`STORE_BACKEND=memory`). El commit toma el write lock durante la
//! verificación de precondiciones y la aplicación de escrituras, así que
//! es atómico frente a commits concurrentes.

use super::{Document, DocumentStore, Expected, Mutation, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredDoc {
    version: u64,
    data: Value,
}

type Collections = HashMap<String, HashMap<String, StoredDoc>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.inner.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.get(id).map(|doc| Document {
                id: id.to_string(),
                version: doc.version,
                data: doc.data.clone(),
            })
        }))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.inner.read().await;
        let mut results = Vec::new();
        if let Some(docs) = collections.get(collection) {
            for (id, doc) in docs.iter() {
                if doc.data.get(field).and_then(Value::as_str) == Some(value) {
                    results.push(Document {
                        id: id.clone(),
                        version: doc.version,
                        data: doc.data.clone(),
                    });
                }
            }
        }
        Ok(results)
    }

    async fn commit(&self, mutations: Vec<Mutation>) -> Result<(), StoreError> {
        let mut collections = self.inner.write().await;

        // Primero verificar todas las precondiciones, después aplicar
        for mutation in &mutations {
            let current = collections
                .get(&mutation.collection)
                .and_then(|docs| docs.get(&mutation.id));
            match (mutation.expected, current) {
                (Expected::Absent, None) => {}
                (Expected::Absent, Some(_)) => return Err(StoreError::Conflict),
                (Expected::Version(v), Some(doc)) if doc.version == v => {}
                (Expected::Version(_), _) => return Err(StoreError::Conflict),
                (Expected::Any, _) => {}
            }
        }

        for mutation in mutations {
            let docs = collections.entry(mutation.collection).or_default();
            let version = docs.get(&mutation.id).map(|d| d.version + 1).unwrap_or(1);
            docs.insert(
                mutation.id,
                StoredDoc {
                    version,
                    data: mutation.data,
                },
            );
        }

        Ok(())
    }
}
