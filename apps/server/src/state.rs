//! Shared application state

use crate::{
    config::Config,
    db::{ClinicalStore, PostgresClinicalStore},
    services::{MetadataService, ObservationService, PatientService},
    Result,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ClinicalStore>,
    pub patient_service: Arc<PatientService>,
    pub observation_service: Arc<ObservationService>,
    pub metadata_service: Arc<MetadataService>,
}

impl AppState {
    /// Connect to Postgres, apply migrations if configured, and wire the
    /// services over a [`PostgresClinicalStore`].
    pub async fn new(config: Config) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let db_pool = create_db_pool(&config).await?;

        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&db_pool)
                .await
                .map_err(|e| crate::Error::Internal(format!("Migration failed: {}", e)))?;
        }

        let store: Arc<dyn ClinicalStore> = Arc::new(PostgresClinicalStore::new(db_pool));
        Ok(Self::with_store(config, store))
    }

    /// Wire the services over an already-built store.
    pub fn with_store(config: Config, store: Arc<dyn ClinicalStore>) -> Self {
        let metadata_service = Arc::new(MetadataService::new(&config));

        Self {
            config: Arc::new(config),
            patient_service: Arc::new(PatientService::new(store.clone())),
            observation_service: Arc::new(ObservationService::new(store.clone())),
            metadata_service,
            store,
        }
    }
}

async fn create_db_pool(config: &Config) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let statement_timeout = config.database.statement_timeout_seconds;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.pool_timeout_seconds,
        ))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                // Set statement timeout (max query execution time)
                sqlx::query(&format!("SET statement_timeout = '{}s'", statement_timeout))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database.url)
        .await
        .map_err(crate::Error::Database)?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}
