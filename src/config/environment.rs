//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de
//! configuración, incluida la política de reintentos del servicio.

use std::env;

use crate::utils::backoff::RetryConfig;

/// Backend del document store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub store_backend: StoreBackend,
    pub cors_origins: Vec<String>,
    pub retry: RetryConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            store_backend: StoreBackend::Memory,
            cors_origins: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Lee la configuración del entorno, con defaults de desarrollo
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retry_defaults = RetryConfig::default();

        Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_env("PORT", defaults.port),
            host: env::var("HOST").unwrap_or(defaults.host),
            store_backend: match env::var("STORE_BACKEND").as_deref() {
                Ok("postgres") => StoreBackend::Postgres,
                _ => StoreBackend::Memory,
            },
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            retry: RetryConfig {
                max_attempts: parse_env("RETRY_MAX_ATTEMPTS", retry_defaults.max_attempts),
                base_delay_ms: parse_env("RETRY_BASE_DELAY_MS", retry_defaults.base_delay_ms),
                multiplier: parse_env("RETRY_MULTIPLIER", retry_defaults.multiplier),
                max_delay_ms: parse_env("RETRY_MAX_DELAY_MS", retry_defaults.max_delay_ms),
                attempt_timeout_ms: parse_env(
                    "RETRY_ATTEMPT_TIMEOUT_MS",
                    retry_defaults.attempt_timeout_ms,
                ),
            },
        }
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
