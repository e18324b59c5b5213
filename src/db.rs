use crate::config::AppConfig;
use crate::errors::ServiceError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool to the database
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    connect_with_options(opt).await
}

/// Establishes a connection pool using pool settings from application config
pub async fn establish_connection_from_app_config(
    config: &AppConfig,
) -> Result<DbPool, ServiceError> {
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .sqlx_logging(config.is_development());

    connect_with_options(opt).await
}

async fn connect_with_options(opt: ConnectOptions) -> Result<DbPool, ServiceError> {
    debug!("connecting to database");

    let pool = Database::connect(opt).await?;

    info!("database connection established");
    Ok(pool)
}

/// Applies all pending schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::from)?;
    info!("database migrations applied");
    Ok(())
}
