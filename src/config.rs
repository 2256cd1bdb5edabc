use std::net::SocketAddr;
use std::path::PathBuf;

use crate::models::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Server configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub page_size: u32,
    pub seed_file: Option<PathBuf>,
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    /// DATABASE_URL defaults to "sqlite://sipzy.db"
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://sipzy.db".to_string());

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("LISTEN_ADDR", "must be a valid socket address"))?;

        let page_size = match lookup("SIPZY_PAGE_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
                .ok_or(ConfigError::Invalid(
                    "SIPZY_PAGE_SIZE",
                    "must be an integer between 1 and 100",
                ))?,
            None => DEFAULT_PAGE_SIZE,
        };

        let seed_file = lookup("SIPZY_SEED_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let static_dir = PathBuf::from(
            lookup("SIPZY_STATIC_DIR").unwrap_or_else(|| "static".to_string()),
        );

        Ok(Config {
            listen_addr,
            database_url,
            page_size,
            seed_file,
            static_dir,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
