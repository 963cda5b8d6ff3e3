//! Servers command - inventory listing and export

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::PathBuf;

use nimbus_ops_core::{
    domain_list, domain_projection, server_projection, AppConfig, AppFilter, ArtifactWriter,
    PlatformClient, Server,
};

#[derive(Args)]
pub struct ServersCommand {
    #[command(subcommand)]
    command: ServersSubcommand,
}

#[derive(Subcommand)]
enum ServersSubcommand {
    /// List servers and their applications
    List(ListCommand),

    /// Export the inventory to timestamped artifacts
    Export(ExportCommand),
}

#[derive(Args)]
struct ListCommand {
    /// Filter keyword: all, wordpress, or an exact application type tag
    #[arg(short, long, default_value = "all")]
    filter: String,
}

#[derive(Args)]
struct ExportCommand {
    /// Filter keyword: all, wordpress, or an exact application type tag
    #[arg(short, long, default_value = "all")]
    filter: String,

    /// Export the server-grouped projection instead of the domain map
    #[arg(long)]
    by_server: bool,

    /// Output directory for the artifacts
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

impl ServersCommand {
    pub async fn execute(&self, config: &AppConfig, json: bool) -> Result<()> {
        match &self.command {
            ServersSubcommand::List(cmd) => cmd.execute(config, json).await,
            ServersSubcommand::Export(cmd) => cmd.execute(config).await,
        }
    }
}

/// Authenticate and fetch the complete inventory
async fn fetch_inventory(config: &AppConfig) -> Result<Vec<Server>> {
    let credentials = config.credentials();
    let session = PlatformClient::new(&config.endpoints().platform_base)?
        .authenticate(&credentials.email, &credentials.api_key)
        .await?;

    println!("{} 正在获取服务器列表...", "⏳".cyan());
    Ok(session.fetch_servers().await?)
}

impl ListCommand {
    async fn execute(&self, config: &AppConfig, json: bool) -> Result<()> {
        let filter = AppFilter::parse(&self.filter);
        let servers = fetch_inventory(config).await?;
        let projection = server_projection(&servers, &filter);

        if json {
            println!("{}", serde_json::to_string_pretty(&projection)?);
            return Ok(());
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["服务器 IP", "登录用户", "域名", "类型", "数据库"]);

        let mut app_count = 0;
        for (ip, entry) in &projection {
            for app in &entry.apps {
                app_count += 1;
                table.add_row(vec![
                    ip,
                    &entry.master_user,
                    &app.domain,
                    &app.app_type,
                    &app.database,
                ]);
            }
        }

        println!("{table}");
        println!();
        println!(
            "共 {} 台服务器 / {} 个应用 (过滤: {})",
            projection.len(),
            app_count,
            filter.keyword()
        );

        Ok(())
    }
}

impl ExportCommand {
    async fn execute(&self, config: &AppConfig) -> Result<()> {
        let filter = AppFilter::parse(&self.filter);
        let servers = fetch_inventory(config).await?;
        let writer = ArtifactWriter::new(&self.out);

        let json_path = if self.by_server {
            let projection = server_projection(&servers, &filter);
            writer.write_json("servers", filter.keyword(), &projection)?
        } else {
            let projection = domain_projection(&servers, &filter);
            writer.write_json("server_db", filter.keyword(), &projection)?
        };

        let domains = domain_list(&servers, &filter);
        let txt_path = writer.write_domains(filter.keyword(), &domains)?;

        println!("{} 导出完成", "✓".green().bold());
        println!("  {} {}", "清单:".cyan(), json_path.display());
        println!("  {} {}", "域名列表:".cyan(), txt_path.display());
        println!("  {} {}", "域名数量:".cyan(), domains.len());

        Ok(())
    }
}
