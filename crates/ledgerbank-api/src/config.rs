//! Environment-based configuration.

use crate::error::AppError;

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the durable append store (`DATABASE_URL`).
    pub store_connection: String,
    /// Address of the messaging substrate (`REDIS_URL`).
    pub bus_bootstrap: String,
    /// Consumer-group identifier used by the query side
    /// (`BUS_CONSUMER_GROUP`).
    pub bus_consumer_group: String,
    /// Bound on re-publication attempts on transient publish failure
    /// (`PUBLISH_RETRY_MAX`).
    pub publish_retry_max: u32,
    /// Listener host (`HOST`).
    pub host: String,
    /// Listener port (`PORT`).
    pub port: u16,
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when a required variable is missing or
    /// a value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        let store_connection = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
        let bus_bootstrap = std::env::var("REDIS_URL")
            .map_err(|_| AppError::Config("REDIS_URL environment variable must be set".into()))?;
        let bus_consumer_group =
            std::env::var("BUS_CONSUMER_GROUP").unwrap_or_else(|_| "account-query".to_string());
        let publish_retry_max = std::env::var("PUBLISH_RETRY_MAX")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("PUBLISH_RETRY_MAX must be a u32: {err}")))?;
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("PORT must be a valid u16: {err}")))?;

        Ok(Self {
            store_connection,
            bus_bootstrap,
            bus_consumer_group,
            publish_retry_max,
            host,
            port,
        })
    }
}
