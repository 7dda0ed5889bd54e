use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_control::config::EnvironmentConfig;
use fleet_control::database::DatabaseConnection;
use fleet_control::{create_app_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleet_control=debug,tower_http=info,sqlx=warn")),
        )
        .init();

    info!("🚚 Fleet Control - Gestión de flota");
    info!("===================================");

    let config = EnvironmentConfig::from_env()?;
    info!("⚙️  Entorno: {}", config.environment);
    if config.cors_origins.is_empty() && !config.is_development() {
        warn!("⚠️  CORS_ORIGINS vacío fuera de desarrollo: se acepta cualquier origen");
    }

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::connect(&config.database).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {:#}", e);
            return Err(e);
        }
    };

    let addr = config.server_url();
    let app = create_app_router(AppState::new(db_connection.pool().clone(), config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   POST /api/auth/login");
    info!("   GET|POST|PUT|DELETE /api/vehicles, /api/drivers, /api/managers");
    info!("   GET|POST|PUT|DELETE /api/events");
    info!("   GET  /api/events/audit");
    info!("   GET  /api/dashboard, /api/dashboard/alerts");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_connection.close().await;
    info!("👋 Servidor detenido");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Error instalando el handler de Ctrl+C: {}", e);
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
                error!("Error instalando el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Señal de apagado recibida");
}
