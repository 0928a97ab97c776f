//! Contrato del document store transaccional
//!
//! El motor de capacidad no asume un backend concreto: trabaja contra un
//! store de documentos versionados con commits condicionales. El ciclo es
//! leer (capturando versiones), computar en memoria y commitear con
//! precondiciones de versión; si otro cliente commiteó primero, el store
//! reporta `Conflict` y el servicio reintenta desde la lectura.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Colección de documentos Mountain
pub const MOUNTAINS: &str = "mountains";
/// Colección de documentos Registration
pub const REGISTRATIONS: &str = "registrations";

/// Errores del document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Otra transacción commiteó primero sobre alguno de los documentos
    #[error("write conflict: another transaction committed first")]
    Conflict,

    /// Falla de transporte o backend
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// Documento que no decodifica al tipo esperado
    #[error("corrupt document '{id}': {reason}")]
    Corrupt { id: String, reason: String },
}

/// Documento versionado tal como lo entrega el store
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub data: Value,
}

impl Document {
    /// Decodifica el documento a un tipo fuerte en la frontera con el store
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(|e| StoreError::Corrupt {
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// Precondición de escritura sobre un documento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// El documento no debe existir (creación)
    Absent,
    /// El documento debe seguir en la versión observada
    Version(u64),
    /// Sin precondición (upsert administrativo)
    Any,
}

/// Escritura condicional dentro de un commit atómico
#[derive(Debug, Clone)]
pub struct Mutation {
    pub collection: String,
    pub id: String,
    pub expected: Expected,
    pub data: Value,
}

impl Mutation {
    pub fn create<T: Serialize>(
        collection: &str,
        id: impl Into<String>,
        body: &T,
    ) -> Result<Self, StoreError> {
        Self::with_expected(collection, id, Expected::Absent, body)
    }

    pub fn update<T: Serialize>(
        collection: &str,
        id: impl Into<String>,
        version: u64,
        body: &T,
    ) -> Result<Self, StoreError> {
        Self::with_expected(collection, id, Expected::Version(version), body)
    }

    pub fn put<T: Serialize>(
        collection: &str,
        id: impl Into<String>,
        body: &T,
    ) -> Result<Self, StoreError> {
        Self::with_expected(collection, id, Expected::Any, body)
    }

    fn with_expected<T: Serialize>(
        collection: &str,
        id: impl Into<String>,
        expected: Expected,
        body: &T,
    ) -> Result<Self, StoreError> {
        let id = id.into();
        let data = serde_json::to_value(body).map_err(|e| StoreError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            collection: collection.to_string(),
            id,
            expected,
            data,
        })
    }
}

/// Cliente de document store con commits condicionales atómicos.
///
/// `commit` debe verificar todas las precondiciones y aplicar todas las
/// escrituras como una unidad: o todo queda aplicado o nada, y cualquier
/// precondición fallida reporta `Conflict`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Query simple por igualdad de un campo de primer nivel
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError>;

    async fn commit(&self, mutations: Vec<Mutation>) -> Result<(), StoreError>;
}
