//! `audit-watch nodes`: print the swarm's node directory.

use anyhow::{Context, Result};
use colored::Colorize;

use audit_watch::config::Config;
use audit_watch::{AuditApi, AuditClient};

use super::{print_structured, OutputFormat};

pub fn run(cfg: Config, format: OutputFormat) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let client = AuditClient::from_config(&cfg)?;
        let nodes = client
            .list_nodes()
            .await
            .with_context(|| format!("listing nodes from {}", client.base_url()))?;

        match format {
            OutputFormat::Table => {
                let noun = if nodes.len() == 1 { "node" } else { "nodes" };
                println!("{}", format!("{} {}", nodes.len(), noun).bold());
                for node in &nodes {
                    println!("  {}", node);
                }
            }
            format => print_structured(format, &nodes)?,
        }
        Ok(())
    })
}
