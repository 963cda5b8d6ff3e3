//! Cache command - caching-plugin configuration generation

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use std::path::PathBuf;

use nimbus_ops_core::{
    build_request, ArtifactWriter, CacheGenClient, PrimaryTheme, WpCli, DEFAULT_CACHEGEN_BASE,
};

fn cachegen_base(flag: &Option<String>) -> String {
    flag.clone()
        .or_else(|| std::env::var("CACHEGEN_API_BASE").ok())
        .unwrap_or_else(|| DEFAULT_CACHEGEN_BASE.to_string())
}

#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand)]
enum CacheSubcommand {
    /// Check the configuration-generation service
    Health(HealthCommand),

    /// Generate a caching-plugin configuration for a local site
    Generate(GenerateCommand),
}

#[derive(Args)]
struct HealthCommand {
    /// Generator API base URL
    #[arg(long)]
    api_url: Option<String>,
}

#[derive(Args)]
struct GenerateCommand {
    /// Path of the local CMS installation
    #[arg(short, long)]
    site: PathBuf,

    /// Site domain sent to the generator
    #[arg(short, long)]
    domain: String,

    /// Generator API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Send the parent theme as the primary theme instead of the child
    #[arg(long)]
    parent_primary: bool,

    /// Ask the generator to analyze the live domain
    #[arg(long)]
    analyze: bool,

    /// Output directory for the generated configuration
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

impl CacheCommand {
    pub async fn execute(&self, json: bool) -> Result<()> {
        match &self.command {
            CacheSubcommand::Health(cmd) => cmd.execute(json).await,
            CacheSubcommand::Generate(cmd) => cmd.execute().await,
        }
    }
}

impl HealthCommand {
    async fn execute(&self, json: bool) -> Result<()> {
        let client = CacheGenClient::new(&cachegen_base(&self.api_url))?;
        let health = client.health().await?;

        if json {
            println!(
                "{}",
                serde_json::json!({ "status": health.status, "version": health.version })
            );
        } else {
            println!("{} 生成服务正常", "✓".green().bold());
            println!("  {} {}", "状态:".cyan(), health.status);
            println!("  {} {}", "版本:".cyan(), health.version);
        }

        Ok(())
    }
}

impl GenerateCommand {
    async fn execute(&self) -> Result<()> {
        // wp-cli must be present before anything else runs
        let wp = WpCli::locate(&self.site)?;

        let client = CacheGenClient::new(&cachegen_base(&self.api_url))?;
        let health = client.health().await?;
        println!(
            "{} 生成服务正常 (版本 {})",
            "✓".green(),
            health.version
        );

        println!("{} 正在读取站点插件/主题...", "⏳".cyan());
        let plugins = wp.active_plugins()?;
        let theme = wp.active_theme()?;
        println!(
            "  {} {} 个插件, 主题 {} (父主题 {})",
            "发现:".cyan(),
            plugins.len(),
            theme.stylesheet,
            theme.template
        );

        let primary = if self.parent_primary {
            PrimaryTheme::Parent
        } else {
            PrimaryTheme::Child
        };
        let request = build_request(plugins, &theme, &self.domain, self.analyze, primary);

        println!("{} 正在生成缓存配置...", "⏳".cyan());
        let document = client.generate(&request).await?;

        let writer = ArtifactWriter::new(&self.out);
        let path = writer.write_cache_config(&document)?;

        println!("{} 配置已生成", "✓".green().bold());
        println!("  {} {}", "文件:".cyan(), path.display());

        Ok(())
    }
}
