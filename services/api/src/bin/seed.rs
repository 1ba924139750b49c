//! services/api/src/bin/seed.rs
//!
//! Loads the demo user and habit into the Postgres database named by
//! `DATABASE_URL`, running migrations first.

use api_lib::{
    adapters::{DbAdapter, SystemClock},
    config::{Config, ConfigError},
    error::ApiError,
    seed::{seed_demo_data, DEMO_EMAIL, DEMO_PASSWORD},
    web::state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = config
        .database_url
        .clone()
        .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&database_url)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);
    db_adapter.run_migrations().await?;

    let state = AppState::new(Arc::new(db_adapter), Arc::new(SystemClock), config);
    if seed_demo_data(&state).await?.is_some() {
        info!("Database seeded. Log in as {} / {}", DEMO_EMAIL, DEMO_PASSWORD);
    }
    Ok(())
}
