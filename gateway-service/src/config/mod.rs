use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::services::path_pattern::PathPattern;

const DEFAULT_WHITELIST: &str = "/login,/admin,/admin/login,/health,/static/**";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    pub user: UserConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Memory,
    Mongo(MongoConfig),
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub expiry_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct UserConfig {
    /// Seed password for new users and for the admin before its first change.
    pub default_password: SecretString,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    /// Path patterns served without a session.
    pub whitelist: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: Option<&str>, required: bool| {
            get_env(&lookup, key, default, required)
        };

        let environment: Environment = var("ENVIRONMENT", Some("dev"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let storage = match var("STORAGE_BACKEND", Some("memory"), false)?
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageConfig::Memory,
            "mongo" | "mongodb" => StorageConfig::Mongo(MongoConfig {
                uri: var("MONGODB_URI", None, true)?,
                database: var("MONGODB_DATABASE", Some("yada_auth"), false)?,
            }),
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Invalid storage backend: {}",
                    other
                )))
            }
        };

        let config = GatewayConfig {
            common,
            environment,
            service_name: var("SERVICE_NAME", Some("gateway-service"), false)?,
            service_version: var("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: var("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
            storage,
            jwt: JwtConfig {
                secret: SecretString::new(var("JWT_SECRET", Some("yadajwt"), is_prod)?),
                expiry_seconds: var("TOKEN_EXPIRY_SECONDS", Some("3600"), false)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(
                            "TOKEN_EXPIRY_SECONDS is not a number: {}",
                            e
                        ))
                    })?,
            },
            user: UserConfig {
                default_password: SecretString::new(var(
                    "DEFAULT_PASSWORD",
                    Some("changepwd"),
                    is_prod,
                )?),
            },
            security: SecurityConfig {
                allowed_origins: split_list(&var(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    false,
                )?),
                whitelist: split_list(&var("WHITELIST", Some(DEFAULT_WHITELIST), false)?),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.expiry_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_EXPIRY_SECONDS must be positive"
            )));
        }

        if self.jwt.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        for pattern in &self.security.whitelist {
            PathPattern::parse(pattern).map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid WHITELIST entry: {}", e))
            })?;
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if matches!(self.storage, StorageConfig::Memory) {
                tracing::warn!("In-memory storage in production - data is lost on restart");
            }
        }

        Ok(())
    }
}

fn get_env<F>(
    lookup: &F,
    key: &str,
    default: Option<&str>,
    required: bool,
) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(core_config::Config::default(), |key| vars.get(key).cloned())
    }

    #[test]
    fn test_dev_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.environment, Environment::Dev);
        assert_eq!(config.jwt.expiry_seconds, 3600);
        assert_eq!(config.jwt.secret.expose_secret(), "yadajwt");
        assert!(matches!(config.storage, StorageConfig::Memory));
        assert_eq!(
            config.security.whitelist,
            vec!["/login", "/admin", "/admin/login", "/health", "/static/**"]
        );
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_prod_requires_secrets() {
        let err = load(&[("ENVIRONMENT", "prod")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let config = load(&[
            ("ENVIRONMENT", "prod"),
            ("JWT_SECRET", "s3cret"),
            ("DEFAULT_PASSWORD", "initial"),
        ])
        .unwrap();
        assert_eq!(config.environment, Environment::Prod);
    }

    #[test]
    fn test_rejects_wildcard_origin_in_prod() {
        let result = load(&[
            ("ENVIRONMENT", "prod"),
            ("JWT_SECRET", "s3cret"),
            ("DEFAULT_PASSWORD", "initial"),
            ("ALLOWED_ORIGINS", "*"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mongo_backend_requires_uri() {
        assert!(load(&[("STORAGE_BACKEND", "mongo")]).is_err());

        let config = load(&[
            ("STORAGE_BACKEND", "mongo"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
        ])
        .unwrap();
        match config.storage {
            StorageConfig::Mongo(mongo) => assert_eq!(mongo.database, "yada_auth"),
            StorageConfig::Memory => panic!("expected mongo backend"),
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(load(&[("TOKEN_EXPIRY_SECONDS", "0")]).is_err());
        assert!(load(&[("TOKEN_EXPIRY_SECONDS", "soon")]).is_err());
        assert!(load(&[("WHITELIST", "login")]).is_err());
        assert!(load(&[("ENVIRONMENT", "staging")]).is_err());
    }
}
