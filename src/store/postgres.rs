//! Document store sobre PostgreSQL
//!
//! Los documentos viven en una única tabla `documents` con payload JSONB
//! y un contador de versión por documento. El commit corre dentro de una
//! transacción sqlx: cada escritura lleva su guarda de versión en el WHERE
//! y cualquier guarda que no matchea aborta el batch completo con
//! `Conflict`, que es la señal de reintento para el servicio.

use super::{Document, DocumentStore, Expected, Mutation, StoreError};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT version, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(|row| Document {
            id: id.to_string(),
            version: row.get::<i64, _>("version") as u64,
            data: row.get("data"),
        }))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, version, data FROM documents WHERE collection = $1 AND data->>$2 = $3",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows
            .into_iter()
            .map(|row| Document {
                id: row.get("id"),
                version: row.get::<i64, _>("version") as u64,
                data: row.get("data"),
            })
            .collect())
    }

    async fn commit(&self, mutations: Vec<Mutation>) -> Result<(), StoreError> {
        let mut txn = self.pool.begin().await.map_err(unavailable)?;

        for mutation in mutations {
            let affected = match mutation.expected {
                Expected::Absent => sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, version, data)
                    VALUES ($1, $2, 1, $3)
                    ON CONFLICT (collection, id) DO NOTHING
                    "#,
                )
                .bind(&mutation.collection)
                .bind(&mutation.id)
                .bind(&mutation.data)
                .execute(&mut *txn)
                .await
                .map_err(unavailable)?
                .rows_affected(),

                Expected::Version(version) => sqlx::query(
                    r#"
                    UPDATE documents SET data = $4, version = version + 1
                    WHERE collection = $1 AND id = $2 AND version = $3
                    "#,
                )
                .bind(&mutation.collection)
                .bind(&mutation.id)
                .bind(version as i64)
                .bind(&mutation.data)
                .execute(&mut *txn)
                .await
                .map_err(unavailable)?
                .rows_affected(),

                Expected::Any => sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, version, data)
                    VALUES ($1, $2, 1, $3)
                    ON CONFLICT (collection, id)
                    DO UPDATE SET data = EXCLUDED.data, version = documents.version + 1
                    "#,
                )
                .bind(&mutation.collection)
                .bind(&mutation.id)
                .bind(&mutation.data)
                .execute(&mut *txn)
                .await
                .map_err(unavailable)?
                .rows_affected(),
            };

            if affected != 1 {
                // Guarda de versión fallida: rollback implícito al soltar la txn
                return Err(StoreError::Conflict);
            }
        }

        txn.commit().await.map_err(unavailable)?;
        Ok(())
    }
}
