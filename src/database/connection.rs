//! Configuración de conexión a PostgreSQL
//!
//! Este módulo maneja la conexión a la base de datos y el bootstrap del
//! schema de la tabla de documentos.

use anyhow::Result;
use sqlx::PgPool;

/// Crear un pool de conexiones a la base de datos
pub async fn create_pool(database_url: Option<&str>) -> Result<PgPool> {
    let database_url = match database_url {
        Some(url) => url.to_string(),
        None => std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set for the postgres backend"))?,
    };

    let pool = PgPool::connect(&database_url).await?;

    Ok(pool)
}

/// Crear la tabla de documentos si no existe
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            version BIGINT NOT NULL,
            data JSONB NOT NULL,
            PRIMARY KEY (collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Índice para las queries por montaña sobre las inscripciones
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_mountain_id ON documents ((data->>'mountainId'))",
    )
    .execute(pool)
    .await?;

    Ok(())
}
