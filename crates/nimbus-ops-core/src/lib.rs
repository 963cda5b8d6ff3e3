//! nimbus-ops-core - Core shared library for the Nimbus Ops CLI
//!
//! This crate provides shared functionality for:
//! - Configuration and credential management
//! - Error handling
//! - Hosting platform REST API client
//! - Inventory filtering and projections
//! - SSH key validation and deployment
//! - Caching-plugin configuration generation

pub mod cachegen;
pub mod config;
pub mod error;
pub mod inventory;
pub mod platform;
pub mod report;
pub mod sshkey;
pub mod utils;

// Re-exports for convenience
pub use cachegen::{
    build_request, CacheGenClient, GenerateRequest, HealthStatus, PrimaryTheme, ThemeInfo, WpCli,
};
pub use config::{AppConfig, Credentials, Endpoints, DEFAULT_CACHEGEN_BASE};
pub use error::{handle_error, OpsError, Result};
pub use inventory::{domain_list, domain_projection, server_projection, AppFilter};
pub use platform::{App, KeyPusher, PlatformClient, PlatformSession, Server, UploadResponse};
pub use report::ArtifactWriter;
pub use sshkey::{deploy_key, load_public_key, UploadOutcome, UploadSummary, UPLOAD_PACING};
pub use utils::expand_tilde;
