//! Database connection management
//!
//! Builds the connection pool and creates the schema.

pub mod homes;
pub mod queries;
pub mod users;

pub use homes::HomeService;
pub use users::UserService;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

/// Create a connection pool and check it with a round trip
pub async fn create_pool(config: &DatabaseConfig) -> Result<Pool, AppError> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(config.max_pool_size));

    let created = if config.require_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
        cfg.create_pool(Some(Runtime::Tokio1), tls)
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
    };
    let pool = created.map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))?;

    // Test connection
    let client = pool.get().await?;
    client.query_one("SELECT 1", &[]).await?;
    drop(client);

    info!(
        "Database pool established (host: {}, db: {}, TLS: {})",
        config.host, config.database, config.require_tls
    );
    Ok(pool)
}

/// Create tables and indexes if they don't exist
pub async fn init_schema(pool: &Pool) -> Result<(), AppError> {
    let client = pool.get().await?;
    for statement in queries::SCHEMA {
        client.execute(*statement, &[]).await?;
    }

    info!("Database tables initialized");
    Ok(())
}
