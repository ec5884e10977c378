//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Provider-specific settings
//! (LLM, Telegram) live next to their clients; this is the app-level part.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Where conversation state is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "in-memory" | "mem" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown store backend: {}. Supported backends: postgres, memory",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: Option<String>,

    /// Which ChatStateStore implementation to use
    pub store_backend: StoreBackend,

    /// Apply pending migrations on startup
    pub run_migrations: bool,

    /// Serialize message handling per conversation
    pub serialize_conversations: bool,

    /// HTTP port for webhook mode
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) if database_url.is_some() => StoreBackend::Postgres,
            Err(_) => StoreBackend::Memory,
        };

        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL is required when STORE_BACKEND=postgres"
            ));
        }

        let config = Self {
            database_url,
            store_backend,
            run_migrations: parse_bool("RUN_MIGRATIONS", true),
            serialize_conversations: parse_bool("SERIALIZE_CONVERSATIONS", true),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}
