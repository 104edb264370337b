use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct GroupServiceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub directory: DirectoryConfig,
    pub settings: SettingsConfig,
    pub audit: AuditConfig,
    /// OTLP collector for span export; local JSON logs only when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

/// Which directory backend serves group operations. Fixed for the lifetime
/// of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryMode {
    Managed,
    Federated,
}

impl DirectoryMode {
    pub fn from_federated_flag(federated: bool) -> Self {
        if federated {
            DirectoryMode::Federated
        } else {
            DirectoryMode::Managed
        }
    }
}

impl std::fmt::Display for DirectoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryMode::Managed => write!(f, "managed"),
            DirectoryMode::Federated => write!(f, "federated"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    pub mode: DirectoryMode,
    pub pool_id: String,
    /// Base URL of the directory API fronting the user pool.
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    pub mongodb_uri: String,
    pub database: String,
    pub collection: String,
    pub setting_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Logging service that accepts `{"message": ...}` events.
    pub sink_endpoint: String,
}

impl GroupServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let federated = env::var("FEDERATED_LOGIN")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        Ok(GroupServiceConfig {
            common: common_config,
            environment: if is_prod {
                Environment::Prod
            } else {
                Environment::Dev
            },
            service_name: get_env("SERVICE_NAME", Some("group-service"), false)?,
            directory: DirectoryConfig {
                mode: DirectoryMode::from_federated_flag(federated),
                pool_id: get_env("USER_POOL_ID", None, is_prod)?,
                endpoint: get_env("DIRECTORY_ENDPOINT", Some("http://localhost:9229"), is_prod)?,
            },
            settings: SettingsConfig {
                mongodb_uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("group_db"), is_prod)?,
                collection: get_env("SETTINGS_COLLECTION", Some("settings"), false)?,
                setting_id: get_env("SETTINGS_ID", Some("app-config"), false)?,
            },
            audit: AuditConfig {
                sink_endpoint: get_env(
                    "AUDIT_SINK_ENDPOINT",
                    Some("http://localhost:9300/events"),
                    is_prod,
                )?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
