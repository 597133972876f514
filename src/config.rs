use std::{env, str::FromStr};

use thiserror::Error;
use tracing::Level;

use crate::repositories::MongoDbInitializationInfo;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub enum StoreKind {
    MongoDb(MongoDbInitializationInfo),
    InMemory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreKind,
    pub log_path: Option<String>,
    pub log_level: Level,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("AXUM_PORT") {
            Some(value) => parse("AXUM_PORT", value)?,
            None => DEFAULT_PORT,
        };

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => parse("LOG_LEVEL", value)?,
            None => Level::DEBUG,
        };

        let store = match lookup("PRODUCT_STORE").as_deref() {
            None | Some("mongodb") => StoreKind::MongoDb(MongoDbInitializationInfo {
                uri: required(&lookup, "MONGODB_URI")?,
                database: required(&lookup, "MONGODB_DB")?,
                collection: required(&lookup, "MONGODB_COLLECTION")?,
            }),
            Some("memory") => StoreKind::InMemory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "PRODUCT_STORE",
                    value: other.to_string(),
                })
            }
        };

        Ok(AppConfig {
            port,
            store,
            log_path: lookup("LOG_PATH"),
            log_level,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or(ConfigError::Missing(key))
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
