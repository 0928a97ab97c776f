use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use dotenvy::dotenv;
use hiking_registration::config::environment::{EnvironmentConfig, StoreBackend};
use hiking_registration::database::connection;
use hiking_registration::state::AppState;
use hiking_registration::store::{DocumentStore, MemoryStore, PostgresStore};
use hiking_registration::build_app;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("⛰️ Hiking Registration - Motor de capacidad de rutas");
    info!("====================================================");

    let config = EnvironmentConfig::from_env();

    // Inicializar el document store según el backend configurado
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Memory => {
            info!("🗄️ Document store en memoria (solo desarrollo/tests)");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            let pool = match connection::create_pool(None).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(e);
                }
            };
            connection::ensure_schema(&pool).await?;
            info!("✅ PostgreSQL conectado, schema de documentos listo");
            Arc::new(PostgresStore::new(pool))
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app = build_app(AppState::new(store, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("📝 Inscripciones:");
    info!("   POST /api/registration - Crear inscripción (queda PENDING)");
    info!("   POST /api/registration/:id/approve - Aprobar (reserva cupo)");
    info!("   POST /api/registration/:id/reject - Rechazar");
    info!("   POST /api/registration/:id/cancel - Cancelar (libera si estaba aprobada)");
    info!("   GET  /api/registration/mountain/:id - Listar por montaña");
    info!("⛰️ Montañas y rutas:");
    info!("   GET  /api/mountain/:id - Obtener montaña con disponibilidad");
    info!("   PUT  /api/mountain/:id - Crear/reemplazar montaña");
    info!("   PUT  /api/mountain/:id/route/:route_id/capacity - Redimensionar ruta");
    info!("   POST /api/mountain/:id/reconcile - Reparar contadores");
    info!("   GET  /api/mountain/:id/report - Reporte para el dashboard");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
