use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which persistence backend the repositories run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    /// PostgreSQL for relational entities, MongoDB for sensors
    External,
    /// Process-local maps; nothing survives a restart
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "external" | "postgres" | "db" => Ok(StoreBackend::External),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub postgres_url: Option<String>,
    pub mongo_url: Option<String>,
    pub mongo_database: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub request_timeout_secs: u64,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub password: PasswordConfig,
}

/// Argon2 work factor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parse `name` into `slot` when set; unparsable values keep the default
fn override_from_env<T: std::str::FromStr>(slot: &mut T, name: &str) {
    if let Some(parsed) = env::var(name).ok().and_then(|v| v.parse().ok()) {
        *slot = parsed;
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let profile = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Self::production(),
            Ok("staging") | Ok("stage") => Self::staging(),
            _ => Self::development(),
        };
        profile.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        let server = &mut self.server;
        override_from_env(&mut server.host, "SERVER_HOST");
        override_from_env(&mut server.port, "PORT");
        override_from_env(&mut server.port, "SENSORHUB_PORT");

        let database = &mut self.database;
        override_from_env(&mut database.backend, "STORE_BACKEND");
        if let Ok(url) = env::var("DATABASE_URL") {
            database.postgres_url = Some(url);
        }
        if let Ok(url) = env::var("MONGO_URL") {
            database.mongo_url = Some(url);
        }
        override_from_env(&mut database.mongo_database, "MONGO_DATABASE");
        override_from_env(&mut database.max_connections, "DATABASE_MAX_CONNECTIONS");
        override_from_env(&mut database.connection_timeout, "DATABASE_CONNECTION_TIMEOUT");

        let api = &mut self.api;
        override_from_env(&mut api.request_timeout_secs, "API_REQUEST_TIMEOUT_SECS");
        override_from_env(&mut api.enable_request_logging, "API_ENABLE_REQUEST_LOGGING");
        override_from_env(&mut api.max_request_size_bytes, "API_MAX_REQUEST_SIZE_BYTES");

        let security = &mut self.security;
        override_from_env(&mut security.jwt_secret, "JWT_SECRET");
        override_from_env(&mut security.jwt_expiry_hours, "SECURITY_JWT_EXPIRY_HOURS");
        override_from_env(&mut security.cookie_secure, "SECURITY_COOKIE_SECURE");
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            security.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        override_from_env(&mut security.password.memory_kib, "PASSWORD_MEMORY_KIB");
        override_from_env(&mut security.password.iterations, "PASSWORD_ITERATIONS");
        override_from_env(&mut security.password.parallelism, "PASSWORD_PARALLELISM");

        self
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.environment != Environment::Development && self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "JWT_SECRET must be at least 32 bytes outside development".to_string(),
            ));
        }
        if self.security.jwt_expiry_hours == 0 {
            return Err(ConfigError::Invalid("SECURITY_JWT_EXPIRY_HOURS must be positive".to_string()));
        }
        if self.database.backend == StoreBackend::External {
            if self.database.postgres_url.is_none() {
                return Err(ConfigError::Missing("DATABASE_URL"));
            }
            if self.database.mongo_url.is_none() {
                return Err(ConfigError::Missing("MONGO_URL"));
            }
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::External,
                postgres_url: None,
                mongo_url: None,
                mongo_database: "sensorhub".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                request_timeout_secs: 30,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 5,
                cookie_secure: false,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                password: PasswordConfig {
                    memory_kib: 19 * 1024,
                    iterations: 2,
                    parallelism: 1,
                },
            },
        }
    }

    /// Development shape with tighter limits, no baked-in secret and secure cookies
    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.request_timeout_secs = 15;
        config.api.max_request_size_bytes = 5 * 1024 * 1024;
        config.security.jwt_secret = String::new();
        config.security.cookie_secure = true;
        config.security.cors_origins = vec!["https://staging.sensorhub.local".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.request_timeout_secs = 10;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 2 * 1024 * 1024;
        config.security.cors_origins = vec!["https://app.sensorhub.local".to_string()];
        config.security.password = PasswordConfig {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        };
        config
    }
}

/// Loaded from the environment on first access
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_expiry_hours, 5);
        assert!(!config.security.cookie_secure);
        assert_eq!(config.database.backend, StoreBackend::External);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.cookie_secure);
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn external_backend_requires_urls() {
        let mut config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));

        config.database.backend = StoreBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn short_secret_rejected_outside_development() {
        let mut config = AppConfig::staging();
        config.database.backend = StoreBackend::Memory;
        config.security.jwt_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.security.jwt_secret = "x".repeat(32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_store_backend() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::External);
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
