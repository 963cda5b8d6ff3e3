//! Configuration management for Nimbus Ops
//!
//! Handles loading and validating:
//! - The credential file (account email, API key, SSH key path/name)
//! - API endpoint base URLs with environment overrides

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OpsError, Result};
use crate::utils::expand_tilde;

const DEFAULT_PLATFORM_BASE: &str = "https://api.nimbushost.com/v1";

/// Default configuration-generation service; the cache workflow also uses
/// this without a credential file
pub const DEFAULT_CACHEGEN_BASE: &str = "https://cfg.nimbushost.dev";

/// Credential file contents
///
/// 凭证只在内存中保留一次运行的时间，不写日志、不落盘。
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub api_key: String,
    #[serde(rename = "sshKeyPath")]
    pub ssh_key_path: String,
    #[serde(rename = "sshKeyName")]
    pub ssh_key_name: String,
}

/// API endpoint base URLs
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub platform_base: String,
    pub cachegen_base: String,
}

/// Application configuration manager
#[derive(Debug, Clone)]
pub struct AppConfig {
    credentials: Credentials,
    endpoints: Endpoints,
}

impl AppConfig {
    /// Load configuration from the credential file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::credentials_path()?)
    }

    /// Load configuration from an explicit credential file path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(OpsError::Configuration(format!(
                "credential file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            OpsError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
            OpsError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })?;

        Self::validate(&credentials)?;

        Ok(Self {
            credentials,
            endpoints: Endpoints {
                platform_base: std::env::var("NIMBUS_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_PLATFORM_BASE.to_string()),
                cachegen_base: std::env::var("CACHEGEN_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_CACHEGEN_BASE.to_string()),
            },
        })
    }

    fn validate(credentials: &Credentials) -> Result<()> {
        let required = [
            ("email", &credentials.email),
            ("api_key", &credentials.api_key),
            ("sshKeyPath", &credentials.ssh_key_path),
            ("sshKeyName", &credentials.ssh_key_name),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(OpsError::Configuration(format!(
                    "credential file is missing a value for `{}`",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Resolve the credential file path
    ///
    /// 优先使用 NIMBUS_OPS_CREDENTIALS 环境变量
    fn credentials_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("NIMBUS_OPS_CREDENTIALS") {
            return Ok(PathBuf::from(expand_tilde(&path)));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| OpsError::Configuration("failed to get home directory".to_string()))?;
        Ok(home.join(".config/nimbus-ops-cli/credentials.json"))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn ssh_key_path(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.credentials.ssh_key_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_credentials(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("credentials.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_credentials(
            &dir,
            r#"{
                "email": "ops@example.com",
                "api_key": "k-123",
                "sshKeyPath": "~/.ssh/id_ed25519.pub",
                "sshKeyName": "ops-key"
            }"#,
        );

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.credentials().email, "ops@example.com");
        assert_eq!(config.credentials().ssh_key_name, "ops-key");
        assert!(!config.ssh_key_path().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, OpsError::Configuration(_)));
    }

    #[test]
    fn test_empty_required_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_credentials(
            &dir,
            r#"{
                "email": "ops@example.com",
                "api_key": "",
                "sshKeyPath": "~/.ssh/id_ed25519.pub",
                "sshKeyName": "ops-key"
            }"#,
        );

        let err = AppConfig::load_from(&path).unwrap_err();
        match err {
            OpsError::Configuration(msg) => assert!(msg.contains("api_key")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
