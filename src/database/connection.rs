//! Conexión a PostgreSQL
//!
//! El pool se abre una vez al arrancar el proceso, se inyecta en `AppState`
//! y se cierra explícitamente en el apagado.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::database::DatabaseConfig;

/// Conexión a la base de datos con ciclo de vida explícito
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Abrir el pool y aplicar las migraciones pendientes
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("🗄️  Conectando a {}", mask_database_url(&config.url));

        let pool = config
            .create_pool()
            .await
            .context("Error abriendo el pool de PostgreSQL")?;

        let connection = Self { pool };
        connection.run_migrations().await?;
        Ok(connection)
    }

    /// Ejecutar migraciones de la base de datos
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Error aplicando migraciones")?;
        info!("✅ Migraciones aplicadas");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Cerrar todas las conexiones del pool
    pub async fn close(self) {
        self.pool.close().await;
        info!("🔌 Pool de PostgreSQL cerrado");
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
