//! Nimbus Ops CLI - Command-line interface for Nimbus hosting operations
//!
//! This CLI provides tools for:
//! - Server/application inventory listing and export
//! - SSH key deployment across the account's servers
//! - Caching-plugin configuration generation

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

mod commands;

use commands::{cache, env, keys, servers, version};
use nimbus_ops_core::AppConfig;

#[derive(Parser)]
#[command(name = "nimbus-ops")]
#[command(author = "Nimbus Ops Team")]
#[command(version)]
#[command(about = "Nimbus Ops CLI - 主机运维工具", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Server inventory operations (list, export)
    Servers(servers::ServersCommand),

    /// SSH key deployment
    Keys(keys::KeysCommand),

    /// Caching-plugin configuration generation
    Cache(cache::CacheCommand),

    /// Show current configuration
    Env(env::EnvCommand),

    /// Show version information
    Version(version::VersionCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Execute command; the cache workflow runs without hosting credentials
    let result = match cli.command {
        Some(Commands::Servers(cmd)) => cmd.execute(&load_config(), cli.json).await,
        Some(Commands::Keys(cmd)) => cmd.execute(&load_config()).await,
        Some(Commands::Cache(cmd)) => cmd.execute(cli.json).await,
        Some(Commands::Env(cmd)) => cmd.execute(&load_config()),
        Some(Commands::Version(cmd)) => cmd.execute(),
        None => {
            // Show help by default
            println!("{}", "Nimbus Ops CLI".bold());
            println!();
            println!("使用 {} 查看帮助", "nimbus-ops --help".cyan());
            Ok(())
        }
    };

    if let Err(e) = result {
        nimbus_ops_core::handle_error(&e.into());
        std::process::exit(1);
    }

    Ok(())
}

fn load_config() -> AppConfig {
    match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            nimbus_ops_core::handle_error(&e);
            std::process::exit(1);
        }
    }
}
