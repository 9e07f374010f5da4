//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The broker password is wrapped in secrecy::SecretString to prevent log leaks.

use std::time::Duration;

use crate::backend::connector::RetryPolicy;
use crate::error::{Error, Result};
use crate::model::PayloadFormat;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Config {
    pub redis: RedisConfig,
    pub rabbitmq: RabbitConfig,
    pub api_port: u16,
    pub payload_format: PayloadFormat,
    pub bootstrap: RetryPolicy,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

#[derive(Debug)]
pub struct RabbitConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub queue: String,
}

impl RabbitConfig {
    /// AMQP URI including credentials. Do not log the result.
    pub fn uri(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}/%2f",
            self.user,
            self.password.expose_secret(),
            self.host,
            self.port
        )
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &str| {
            get(name).ok_or_else(|| {
                Error::Config(format!("required environment variable {name} is not set"))
            })
        };

        let defaults = RetryPolicy::default();
        let bootstrap = RetryPolicy {
            max_attempts: match get("BOOTSTRAP_MAX_ATTEMPTS") {
                Some(v) => parse_var("BOOTSTRAP_MAX_ATTEMPTS", &v)?,
                None => defaults.max_attempts,
            },
            interval: match get("BOOTSTRAP_RETRY_INTERVAL_SECS") {
                Some(v) => Duration::from_secs(parse_var("BOOTSTRAP_RETRY_INTERVAL_SECS", &v)?),
                None => defaults.interval,
            },
            attempt_timeout: match get("BOOTSTRAP_ATTEMPT_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_var("BOOTSTRAP_ATTEMPT_TIMEOUT_SECS", &v)?),
                None => defaults.attempt_timeout,
            },
        };
        if bootstrap.attempt_timeout.is_zero() {
            return Err(Error::Config(
                "BOOTSTRAP_ATTEMPT_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        if bootstrap.max_attempts == 0 {
            return Err(Error::Config(
                "BOOTSTRAP_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            redis: RedisConfig {
                host: required("REDIS_HOST")?,
                port: parse_var("REDIS_PORT", &required("REDIS_PORT")?)?,
            },
            rabbitmq: RabbitConfig {
                host: required("RABBITMQ_HOST")?,
                port: parse_var("RABBITMQ_PORT", &required("RABBITMQ_PORT")?)?,
                user: required("RABBITMQ_USER")?,
                password: SecretString::from(required("RABBITMQ_PASS")?),
                queue: required("RABBITMQ_QUEUE")?,
            },
            api_port: parse_var("QUEUE_API_PORT", &required("QUEUE_API_PORT")?)?,
            payload_format: match get("QUEUE_PAYLOAD_FORMAT") {
                Some(v) => v.parse::<PayloadFormat>().map_err(Error::Config)?,
                None => PayloadFormat::default(),
            },
            bootstrap,
            otel_endpoint: get("OTEL_ENDPOINT"),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("environment variable {name} has invalid value {value:?}")))
}
