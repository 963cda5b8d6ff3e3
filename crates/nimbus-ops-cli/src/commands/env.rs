//! Environment command - show current configuration

use anyhow::Result;
use clap::Args;
use colored::*;

use nimbus_ops_core::AppConfig;

#[derive(Args)]
pub struct EnvCommand;

impl EnvCommand {
    pub fn execute(&self, config: &AppConfig) -> Result<()> {
        let credentials = config.credentials();
        let endpoints = config.endpoints();

        println!("{}", "当前配置".bold());
        println!();
        println!("  {} {}", "账户:".cyan(), credentials.email);
        println!("  {} {}", "API key:".cyan(), "********");
        println!("  {} {}", "SSH 公钥:".cyan(), config.ssh_key_path().display());
        println!("  {} {}", "密钥名称:".cyan(), credentials.ssh_key_name);
        println!();
        println!("{}", "服务端点".bold());
        println!();
        println!("  {} {}", "平台 API:".cyan(), endpoints.platform_base);
        println!("  {} {}", "配置生成:".cyan(), endpoints.cachegen_base);

        Ok(())
    }
}
