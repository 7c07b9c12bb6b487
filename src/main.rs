use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use drive_rental::config::database::{mask_database_url, DatabaseConfig};
use drive_rental::config::{EnvironmentConfig, StorageBackend};
use drive_rental::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging (RUST_LOG, por defecto info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚗 Drive Rental API");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;
    info!("🌍 Entorno: {}", config.environment);

    let state = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .ok_or_else(|| anyhow!("DATABASE_URL no configurada"))?;
            info!("🗄️ Conectando a PostgreSQL en {}", mask_database_url(&url));

            let pool = match DatabaseConfig::new(url).connect_and_migrate().await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow!("Error de base de datos: {}", e));
                }
            };
            info!("✅ Base de datos lista");
            AppState::postgres(pool, config.clone())?
        }
        StorageBackend::Memory => {
            warn!("⚠️ STORAGE=memory: los datos se pierden al reiniciar");
            AppState::in_memory(config.clone())?
        }
    };

    let app = create_router(state);
    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("👤 Cuentas:");
    info!("   POST /api/register | /api/verify-otp | /api/token | /api/token/refresh");
    info!("🚙 Flota:");
    info!("   GET  /api/cars | /api/cars/:id | /api/cars/mine");
    info!("   POST /api/cars  PUT|DELETE /api/cars/:id");
    info!("   GET|POST /api/manufacturers");
    info!("📅 Reservas:");
    info!("   POST /api/bookings  GET /api/bookings | /api/bookings/:id | /api/bookings/:id/history");
    info!("   POST /api/bookings/:id/{{cancel,confirm,delivered,start-driving,return}}");
    info!("💳 Pagos:");
    info!("   POST|GET /api/payments/:booking_id");
    info!("🪪 Verificación:");
    info!("   POST /api/verification/{{upload-selfie,upload-id,upload-selfie-with-id}}");
    info!("   GET  /api/verification/status | /api/verification/images/:kind");
    info!("   POST /api/verification/:user_id/review");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
