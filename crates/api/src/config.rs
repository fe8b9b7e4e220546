//! Process configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} is set but {1} is missing")]
    Incomplete(&'static str, &'static str),
}

/// Pizza factory endpoint and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    pub url: String,
    pub api_key: String,
}

impl std::fmt::Debug for FactoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryConfig")
            .field("url", &self.url)
            .field("api_key", &"***")
            .finish()
    }
}

/// System admin created at startup when absent.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub database_url: Option<String>,
    pub factory: Option<FactoryConfig>,
    pub metrics_period: Duration,
    pub token_sweep_period: Duration,
    pub admin: Option<AdminSeed>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("database", &self.database_url.is_some())
            .field("factory", &self.factory)
            .field("metrics_period", &self.metrics_period)
            .field("token_sweep_period", &self.token_sweep_period)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let factory = match (get("FACTORY_URL"), get("FACTORY_API_KEY")) {
            (Some(url), Some(api_key)) => Some(FactoryConfig { url, api_key }),
            (Some(_), None) => return Err(ConfigError::Incomplete("FACTORY_URL", "FACTORY_API_KEY")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("FACTORY_API_KEY", "FACTORY_URL")),
            (None, None) => None,
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
                email,
                password,
            }),
            (Some(_), None) => return Err(ConfigError::Incomplete("ADMIN_EMAIL", "ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("ADMIN_PASSWORD", "ADMIN_EMAIL")),
            (None, None) => None,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            jwt_secret,
            token_ttl: seconds(&get, "TOKEN_TTL_SECS", 86_400)?,
            database_url: get("DATABASE_URL"),
            factory,
            metrics_period: seconds(&get, "METRICS_PERIOD_SECS", 60)?,
            token_sweep_period: seconds(&get, "TOKEN_SWEEP_SECS", 300)?,
            admin,
        })
    }
}

fn seconds(get: &impl Fn(&str) -> Option<String>, var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match get(var) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
            _ => Err(ConfigError::InvalidNumber { var, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.metrics_period, Duration::from_secs(60));
        assert_eq!(cfg.token_sweep_period, Duration::from_secs(300));
        assert!(cfg.database_url.is_none());
        assert!(cfg.factory.is_none());
        assert!(cfg.admin.is_none());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config(&[("TOKEN_TTL_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { var: "TOKEN_TTL_SECS", .. }));
        assert!(config(&[("METRICS_PERIOD_SECS", "0")]).is_err());
    }

    #[test]
    fn factory_needs_both_url_and_key() {
        assert_eq!(
            config(&[("FACTORY_URL", "https://factory.example")]).unwrap_err(),
            ConfigError::Incomplete("FACTORY_URL", "FACTORY_API_KEY")
        );

        let cfg = config(&[("FACTORY_URL", "https://factory.example"), ("FACTORY_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.factory.unwrap().url, "https://factory.example");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = config(&[
            ("JWT_SECRET", "super-secret"),
            ("ADMIN_EMAIL", "a@jwt.com"),
            ("ADMIN_PASSWORD", "hunter2"),
        ])
        .unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("hunter2"));
    }
}
