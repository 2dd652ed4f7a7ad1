// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};

use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown store backend '{other}' (expected postgres or memory)"),
        }
    }
}

/// Browser origins allowed by CORS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(raw: &str) -> Self {
        if raw.trim() == "*" {
            return CorsOrigins::Any;
        }
        CorsOrigins::List(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub clearance_template: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origins: CorsOrigins,
    pub auth_stub_role: Role,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            store_backend: StoreBackend::Postgres,
            database_url: None,
            db_max_connections: 20,
            clearance_template: PathBuf::from("templates/Clearance_Form.pdf"),
            max_upload_bytes: 10 * 1024 * 1024,
            cors_origins: CorsOrigins::parse("http://localhost:3000,http://127.0.0.1:3000"),
            auth_stub_role: Role::Admin,
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid {name}={raw}")),
    }
}

impl Config {
    /// Read the process environment; `.env` must already be loaded.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();
        let config = Config {
            port: parsed("PORT", defaults.port)?,
            store_backend: parsed("STORE_BACKEND", defaults.store_backend)?,
            database_url: var("DATABASE_URL"),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            clearance_template: var("CLEARANCE_TEMPLATE")
                .map(PathBuf::from)
                .unwrap_or(defaults.clearance_template),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|raw| CorsOrigins::parse(&raw))
                .unwrap_or(defaults.cors_origins),
            auth_stub_role: parsed("AUTH_STUB_ROLE", defaults.auth_stub_role)?,
        };

        if config.store_backend == StoreBackend::Postgres && config.database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }
        if config.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        Ok(config)
    }
}
