//! Caching-plugin configuration generator workflow
//!
//! Gathers the active plugin/theme inventory of a local CMS site through the
//! `wp` CLI collaborator, posts it to the remote configuration-generation
//! API, and returns the generated document.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::debug;

use crate::error::{OpsError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// `GET /health` response
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// `POST /generate-config` request body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateRequest {
    pub plugins: Vec<String>,
    pub domain: String,
    pub analyze_domain: bool,
    pub theme: String,
    pub theme_parent: String,
    pub theme_child: String,
    pub themes: Vec<String>,
}

/// Which of the child/parent theme is sent as the representative `theme`
///
/// 两个主题始终都会出现在 themes 列表里
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryTheme {
    Child,
    Parent,
}

/// Active theme of a site: the stylesheet slug (child) and its template
/// slug (parent); identical for a non-child theme
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeInfo {
    pub stylesheet: String,
    pub template: String,
}

impl ThemeInfo {
    pub fn is_child(&self) -> bool {
        self.stylesheet != self.template
    }
}

/// Build the generator request from the gathered site inventory
pub fn build_request(
    plugins: Vec<String>,
    theme: &ThemeInfo,
    domain: &str,
    analyze_domain: bool,
    primary: PrimaryTheme,
) -> GenerateRequest {
    let representative = match primary {
        PrimaryTheme::Child => theme.stylesheet.clone(),
        PrimaryTheme::Parent => theme.template.clone(),
    };

    let mut themes = vec![theme.stylesheet.clone()];
    if theme.is_child() {
        themes.push(theme.template.clone());
    }

    GenerateRequest {
        plugins,
        domain: domain.to_string(),
        analyze_domain,
        theme: representative,
        theme_parent: theme.template.clone(),
        theme_child: theme.stylesheet.clone(),
        themes,
    }
}

/// Client for the configuration-generation API
pub struct CacheGenClient {
    http: Client,
    base: String,
}

impl CacheGenClient {
    pub fn new(base: &str) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Preflight check of the generator service
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| OpsError::Network(format!("GET {} failed: {}", url, e)))?;

        if !resp.status().is_success() {
            return Err(OpsError::Network(format!(
                "GET {} returned HTTP {}",
                url,
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| OpsError::Network(format!("unreadable health response: {}", e)))
    }

    /// Generate a caching-plugin configuration for the given site inventory
    pub async fn generate(&self, request: &GenerateRequest) -> Result<serde_json::Value> {
        let url = format!("{}/generate-config", self.base);
        debug!(%url, plugins = request.plugins.len(), "requesting config generation");

        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| OpsError::Network(format!("POST {} failed: {}", url, e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| OpsError::Network(format!("unreadable generator response: {}", e)))?;

        if !status.is_success() {
            return Err(OpsError::Schema {
                message: format!("generator returned HTTP {}", status),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| OpsError::Schema {
            message: format!("generator returned non-JSON body: {}", e),
            body,
        })
    }
}

/// Local CMS inventory collaborator, a black-box `wp` command producing JSON
pub struct WpCli {
    site_path: PathBuf,
}

impl WpCli {
    /// Locate the `wp` binary; its absence is fatal at startup
    pub fn locate(site_path: &Path) -> Result<Self> {
        which::which("wp")
            .map_err(|_| OpsError::DependencyMissing("wp (wp-cli) not found in PATH".to_string()))?;

        Ok(Self {
            site_path: site_path.to_path_buf(),
        })
    }

    /// Active plugin slugs
    pub fn active_plugins(&self) -> Result<Vec<String>> {
        let out = self.run(&["plugin", "list", "--status=active", "--field=name", "--format=json"])?;
        serde_json::from_str(&out).map_err(|e| {
            OpsError::CommandExecution(format!("wp plugin list produced invalid JSON: {}", e))
        })
    }

    /// Active theme: stylesheet (child) slug plus its parent template slug
    pub fn active_theme(&self) -> Result<ThemeInfo> {
        let stylesheet = self.run(&["option", "get", "stylesheet"])?.trim().to_string();
        let template = self.run(&["option", "get", "template"])?.trim().to_string();

        if stylesheet.is_empty() || template.is_empty() {
            return Err(OpsError::CommandExecution(
                "wp reported an empty active theme".to_string(),
            ));
        }

        Ok(ThemeInfo { stylesheet, template })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("wp")
            .args(args)
            .arg(format!("--path={}", self.site_path.display()))
            .output()
            .map_err(|e| OpsError::CommandExecution(format!("failed to run wp: {}", e)))?;

        if !output.status.success() {
            return Err(OpsError::CommandExecution(format!(
                "wp {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
