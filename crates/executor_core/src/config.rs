//! Executor deployment configuration.
//!
//! # Responsibility
//! - Describe which principal the executor runs as, who deployed it, and
//!   where state and logs live.
//! - Load that description from JSON.
//!
//! # Invariants
//! - The executor identity is a contract principal.
//! - The deployer never equals the executor identity.

use crate::logging::default_log_level;
use crate::model::principal::Principal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "executor.sqlite3";

/// Deployment configuration for one executor instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Contract principal the executor is deployed at.
    pub executor: Principal,
    /// Deploying authority; executive until `construct` succeeds.
    pub deployer: Principal,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_level")]
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_FILE_NAME)
}

fn default_level() -> String {
    default_log_level().to_string()
}

impl ExecutorConfig {
    /// Creates a config with default storage and logging settings.
    pub fn new(executor: Principal, deployer: Principal) -> Self {
        Self {
            executor,
            deployer,
            db_path: default_db_path(),
            log_level: default_level(),
            log_dir: None,
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.executor.is_contract() {
            return Err(ConfigError::Invalid(format!(
                "executor `{}` must be a contract principal",
                self.executor
            )));
        }
        if self.deployer == self.executor {
            return Err(ConfigError::Invalid(
                "deployer must differ from the executor identity".to_string(),
            ));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ExecutorConfig};
    use crate::model::principal::Principal;
    use std::path::PathBuf;

    #[test]
    fn parses_minimal_document_with_defaults() {
        let config = ExecutorConfig::from_json_str(
            r#"{"executor": "ST1DEPLOYER.executor-dao", "deployer": "ST1DEPLOYER"}"#,
        )
        .expect("minimal config parse");
        assert_eq!(config.executor.contract_name(), Some("executor-dao"));
        assert_eq!(config.db_path, PathBuf::from("executor.sqlite3"));
        assert!(config.log_dir.is_none());
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn rejects_standard_principal_as_executor() {
        let err = ExecutorConfig::from_json_str(
            r#"{"executor": "ST1DEPLOYER", "deployer": "ST2OTHER"}"#,
        )
        .expect_err("standard executor must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_deployer_equal_to_executor() {
        let err = ExecutorConfig::from_json_str(
            r#"{"executor": "ST1DEPLOYER.executor-dao", "deployer": "ST1DEPLOYER.executor-dao"}"#,
        )
        .expect_err("self-deployed executor must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_principal() {
        let err = ExecutorConfig::from_json_str(
            r#"{"executor": "st1.executor", "deployer": "ST1DEPLOYER"}"#,
        )
        .expect_err("malformed principal must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExecutorConfig::load(dir.path().join("missing.json"))
            .expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn written_config_loads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executor.json");
        let mut config = ExecutorConfig::new(
            Principal::contract("ST1DEPLOYER", "executor-dao").unwrap(),
            Principal::standard("ST1DEPLOYER").unwrap(),
        );
        config.db_path = dir.path().join("state.sqlite3");
        config.log_dir = Some(dir.path().join("logs"));
        config.validate().expect("defaults are valid");

        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = ExecutorConfig::load(&path).expect("load written config");
        assert_eq!(loaded, config);
    }
}
