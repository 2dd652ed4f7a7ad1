// src/db/mod.rs

use anyhow::Context;
use sqlx::{Pool, Postgres};

use crate::config::Config;

pub async fn connect(config: &Config) -> anyhow::Result<Pool<Postgres>> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set in your .env file")?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .context("could not connect to PostgreSQL")?;

    tracing::info!(max_connections = config.db_max_connections, "connected to PostgreSQL");
    Ok(pool)
}
