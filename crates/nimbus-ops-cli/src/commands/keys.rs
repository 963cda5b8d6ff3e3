//! Keys command - SSH key deployment across the account's servers

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use std::path::PathBuf;

use nimbus_ops_core::{
    deploy_key, load_public_key, AppConfig, PlatformClient, UploadOutcome, UPLOAD_PACING,
};

#[derive(Args)]
pub struct KeysCommand {
    #[command(subcommand)]
    command: KeysSubcommand,
}

#[derive(Subcommand)]
enum KeysSubcommand {
    /// Upload the SSH public key to every running server
    Deploy(DeployCommand),
}

#[derive(Args)]
struct DeployCommand {
    /// Public key file; defaults to the credential file's sshKeyPath
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Key display name; defaults to the credential file's sshKeyName
    #[arg(short, long)]
    name: Option<String>,

    /// Validate and list the targets without contacting any server
    #[arg(long)]
    dry_run: bool,
}

impl KeysCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        match &self.command {
            KeysSubcommand::Deploy(cmd) => cmd.execute(config).await,
        }
    }
}

impl DeployCommand {
    async fn execute(&self, config: &AppConfig) -> Result<()> {
        let key_path = self.key.clone().unwrap_or_else(|| config.ssh_key_path());
        let key_name = self
            .name
            .clone()
            .unwrap_or_else(|| config.credentials().ssh_key_name.clone());

        // Key format violations are fatal before any network access
        let public_key = load_public_key(&key_path)?;

        let credentials = config.credentials();
        let session = PlatformClient::new(&config.endpoints().platform_base)?
            .authenticate(&credentials.email, &credentials.api_key)
            .await?;

        println!("{} 正在获取服务器列表...", "⏳".cyan());
        let servers = session.fetch_servers().await?;

        let running = servers.iter().filter(|s| s.is_running()).count();
        println!(
            "共 {} 台服务器，其中 {} 台运行中",
            servers.len(),
            running
        );

        if self.dry_run {
            for server in servers.iter().filter(|s| s.is_running()) {
                println!("  {} {} ({})", "→".cyan(), server.id, server.public_ip);
            }
            println!("{} dry-run，未联系任何服务器", "✓".green());
            return Ok(());
        }

        println!(
            "{} 正在上传密钥 \"{}\" 到 {} 台服务器...\n",
            "⏳".cyan(),
            key_name,
            running
        );

        let summary = deploy_key(&session, &servers, &key_name, &public_key, UPLOAD_PACING).await?;

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["服务器", "结果"]);

        for (server_id, outcome) in &summary.outcomes {
            let (text, color) = match outcome {
                UploadOutcome::Created(id) => (format!("✓ 已创建 (key id {})", id), Color::Green),
                UploadOutcome::AlreadyExists => ("✓ 已存在".to_string(), Color::Yellow),
                UploadOutcome::Failed(reason) => (format!("✗ 失败: {}", reason), Color::Red),
            };
            table.add_row(vec![Cell::new(server_id), Cell::new(text).fg(color)]);
        }

        println!("{table}");
        println!();

        if !summary.skipped.is_empty() {
            println!(
                "{} 跳过 {} 台未运行的服务器: {}",
                "⚠".yellow(),
                summary.skipped.len(),
                summary.skipped.join(", ")
            );
        }

        if summary.is_ok() {
            println!(
                "{} 全部成功: {}/{} 台服务器",
                "✓".green().bold(),
                summary.succeeded,
                summary.attempted
            );
            Ok(())
        } else {
            println!(
                "{} {}/{} 台服务器失败: {}",
                "✗".red().bold(),
                summary.failed,
                summary.attempted,
                summary.failed_servers.join(", ")
            );
            Err(anyhow!("{} 台服务器上传失败", summary.failed))
        }
    }
}
