//! Error types and error handling for Nimbus Ops

use thiserror::Error;

/// Result type alias using OpsError
pub type Result<T> = std::result::Result<T, OpsError>;

/// Custom error types for Nimbus Ops operations
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Schema error: {message}")]
    Schema { message: String, body: String },

    #[error("Invalid SSH key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Command execution error: {0}")]
    CommandExecution(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HTTP(#[from] reqwest::Error),

    #[error("General error: {0}")]
    General(#[from] anyhow::Error),
}

/// Handle and display errors with helpful messages
pub fn handle_error(error: &OpsError) {
    eprintln!("✗ 错误: {}", error);

    // If DEBUG environment variable is set, show detailed info
    if std::env::var("DEBUG").is_ok() {
        if let Some(source) = std::error::Error::source(error) {
            eprintln!("\n详细信息:");
            eprintln!("{:?}", source);
        }
    }

    // Provide helpful tips
    match error {
        OpsError::Configuration(_) => {
            eprintln!("\n提示:");
            eprintln!("  • 检查凭证文件: ~/.config/nimbus-ops-cli/credentials.json");
            eprintln!("  • 或设置 NIMBUS_OPS_CREDENTIALS 指向凭证文件");
        }
        OpsError::Authentication(_) => {
            eprintln!("\n提示:");
            eprintln!("  • 检查 email 和 api_key 是否正确");
            eprintln!("  • 在平台控制台重新生成 API key");
        }
        OpsError::InvalidKeyFormat(_) => {
            eprintln!("\n提示:");
            eprintln!("  • 公钥文件应以 ssh-rsa / ssh-ed25519 / ssh-ecdsa 开头");
            eprintln!("  • 确认 ssh_key_path 指向 .pub 文件而不是私钥");
        }
        OpsError::DependencyMissing(_) => {
            eprintln!("\n提示:");
            eprintln!("  • 安装 wp-cli: https://wp-cli.org/#installing");
        }
        OpsError::Schema { body, .. } => {
            eprintln!("\n原始响应:");
            eprintln!("{}", body);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_keeps_raw_body() {
        let err = OpsError::Schema {
            message: "missing `servers` field".to_string(),
            body: "{\"error\":true}".to_string(),
        };
        assert!(err.to_string().contains("missing `servers` field"));
        match err {
            OpsError::Schema { body, .. } => assert_eq!(body, "{\"error\":true}"),
            _ => unreachable!(),
        }
    }
}
