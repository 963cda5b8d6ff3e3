//! Nimbus hosting platform REST API client
//!
//! One client per run: authenticate once, then reuse the bearer token for the
//! inventory fetch and the SSH key uploads. The token lives only in memory
//! and is never logged.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{OpsError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level retries for idempotent GET calls only.
/// The key upload POST is never retried; its failures are classified
/// per server by the upload loop.
const GET_RETRIES: u32 = 2;

/// A server as returned by `GET /server`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub public_ip: String,
    pub master_user: String,
    pub status: String,
    #[serde(default)]
    pub apps: Vec<App>,
}

impl Server {
    /// Only `running` servers are contacted by the uploader
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

/// An application hosted on a server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    /// Application type tag (free-form, e.g. "wordpress", "phpstack")
    pub application: String,
    /// Custom domain; preferred over `app_fqdn` when non-empty
    pub cname: Option<String>,
    /// Generated fully-qualified domain name
    pub app_fqdn: String,
    pub mysql_db_name: String,
}

/// Response of `POST /ssh_key`
///
/// Exactly one of `id` / `message` is expected; both are optional so that
/// classification can inspect whatever the API returned.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub id: Option<serde_json::Value>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerListResponse {
    servers: Option<Vec<Server>>,
}

/// Parse and validate the inventory response body
pub fn parse_server_list(body: &str) -> Result<Vec<Server>> {
    let parsed: ServerListResponse = serde_json::from_str(body).map_err(|e| OpsError::Schema {
        message: format!("failed to parse server list: {}", e),
        body: body.to_string(),
    })?;

    parsed.servers.ok_or_else(|| OpsError::Schema {
        message: "response is missing the `servers` field".to_string(),
        body: body.to_string(),
    })
}

/// Seam for the per-server key upload, so the upload loop can be driven by a
/// stub transport in tests
#[async_trait]
pub trait KeyPusher {
    async fn push_key(
        &self,
        server_id: &str,
        key_name: &str,
        public_key: &str,
    ) -> Result<UploadResponse>;
}

/// Unauthenticated platform client
pub struct PlatformClient {
    http: Client,
    base: String,
}

impl PlatformClient {
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

    /// Exchange email + API key for a bearer token
    ///
    /// Authentication itself is never retried; any failure here terminates
    /// the run before further network access.
    pub async fn authenticate(self, email: &str, api_key: &str) -> Result<PlatformSession> {
        let url = format!("{}/oauth/access_token", self.base);
        debug!(%url, "requesting access token");

        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "email": email, "api_key": api_key }))
            .send()
            .await
            .map_err(|e| OpsError::Authentication(format!("token request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(OpsError::Authentication(format!(
                "token request returned HTTP {}",
                resp.status()
            )));
        }

        let auth: AuthResponse = resp
            .json()
            .await
            .map_err(|e| OpsError::Authentication(format!("unreadable token response: {}", e)))?;

        match auth.access_token {
            Some(token) if !token.is_empty() && token != "null" => Ok(PlatformSession {
                http: self.http,
                base: self.base,
                token,
            }),
            _ => Err(OpsError::Authentication(
                "响应中没有 access_token".to_string(),
            )),
        }
    }
}

/// Authenticated session; holds the bearer token for the rest of the run
pub struct PlatformSession {
    http: Client,
    base: String,
    token: String,
}

impl PlatformSession {
    /// Retrieve the complete server/application inventory
    pub async fn fetch_servers(&self) -> Result<Vec<Server>> {
        let url = format!("{}/server", self.base);
        let body = self.get_with_retry(&url).await?;
        parse_server_list(&body)
    }

    async fn get_with_retry(&self, url: &str) -> Result<String> {
        let mut last_err = String::new();

        for attempt in 0..=GET_RETRIES {
            if attempt > 0 {
                debug!(%url, attempt, "retrying GET");
            }
            match self.http.get(url).bearer_auth(&self.token).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        return Err(OpsError::Network(format!(
                            "GET {} returned HTTP {}",
                            url, status
                        )));
                    }
                    return resp
                        .text()
                        .await
                        .map_err(|e| OpsError::Network(format!("GET {} failed: {}", url, e)));
                }
                Err(e) => last_err = e.to_string(),
            }
        }

        Err(OpsError::Network(format!(
            "GET {} failed after {} attempts: {}",
            url,
            GET_RETRIES + 1,
            last_err
        )))
    }
}

#[async_trait]
impl KeyPusher for PlatformSession {
    /// POST one URL-encoded key payload to a server
    async fn push_key(
        &self,
        server_id: &str,
        key_name: &str,
        public_key: &str,
    ) -> Result<UploadResponse> {
        let url = format!("{}/ssh_key", self.base);
        let body = format!(
            "server_id={}&ssh_key_name={}&ssh_key={}",
            utf8_percent_encode(server_id, NON_ALPHANUMERIC),
            utf8_percent_encode(key_name, NON_ALPHANUMERIC),
            utf8_percent_encode(public_key, NON_ALPHANUMERIC),
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| OpsError::Network(format!("upload to server {} failed: {}", server_id, e)))?;

        resp.json()
            .await
            .map_err(|e| OpsError::Network(format!("unreadable upload response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_list() {
        let body = r#"{
            "servers": [
                {
                    "id": "1001",
                    "public_ip": "203.0.113.10",
                    "master_user": "master_abc",
                    "status": "running",
                    "apps": [
                        {
                            "application": "wordpress",
                            "cname": "",
                            "app_fqdn": "site1.example.com",
                            "mysql_db_name": "db_site1"
                        }
                    ]
                }
            ]
        }"#;

        let servers = parse_server_list(body).unwrap();
        assert_eq!(servers.len(), 1);
        assert!(servers[0].is_running());
        assert_eq!(servers[0].apps[0].app_fqdn, "site1.example.com");
    }

    #[test]
    fn test_parse_server_list_empty_is_valid() {
        let servers = parse_server_list(r#"{"servers": []}"#).unwrap();
        assert!(servers.is_empty());
    }

    #[test]
    fn test_parse_server_list_missing_field_is_schema_error() {
        let body = r#"{"error": "unauthorized"}"#;
        let err = parse_server_list(body).unwrap_err();
        match err {
            OpsError::Schema { body: raw, .. } => assert!(raw.contains("unauthorized")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_server_without_apps_field() {
        let body = r#"{
            "servers": [
                {"id": "7", "public_ip": "198.51.100.1", "master_user": "m", "status": "stopped"}
            ]
        }"#;
        let servers = parse_server_list(body).unwrap();
        assert!(servers[0].apps.is_empty());
        assert!(!servers[0].is_running());
    }
}
