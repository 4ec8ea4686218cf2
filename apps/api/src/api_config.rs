use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use bandstand_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub storage: StorageConfig,
    pub query_max_limit: usize,
    pub default_language: String,
    pub frontend_url: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup.
    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or("API_PORT", optional("API_PORT"), 3001_u16)?;

        let storage = match optional("STORAGE_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StorageConfig::Memory,
            "postgres" => StorageConfig::Postgres {
                database_url: optional("DATABASE_URL")
                    .ok_or_else(|| invalid("DATABASE_URL is required for postgres storage"))?,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    optional("DATABASE_MAX_CONNECTIONS"),
                    10_u32,
                )?,
            },
            other => {
                return Err(invalid(&format!(
                    "STORAGE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        if migrate_only && storage == StorageConfig::Memory {
            return Err(invalid("migrate requires STORAGE_BACKEND=postgres"));
        }

        let query_max_limit = parse_or("QUERY_MAX_LIMIT", optional("QUERY_MAX_LIMIT"), 50_usize)?;
        if query_max_limit == 0 {
            return Err(invalid("QUERY_MAX_LIMIT must be at least 1"));
        }

        let default_language = optional("DEFAULT_LANGUAGE")
            .unwrap_or_else(|| "en".to_owned())
            .to_ascii_lowercase();

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            storage,
            query_max_limit,
            default_language,
            frontend_url: optional("FRONTEND_URL"),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|error| invalid(&format!("invalid {name} '{raw}': {error}"))),
    }
}

fn invalid(detail: &str) -> AppError {
    AppError::Internal(format!("invalid configuration: {detail}"))
}
