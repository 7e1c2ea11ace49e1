//! `templafirm providers [--json]`

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use templafirm_core::Provider;
use templafirm_templater::ProviderRegistry;

#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Print machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ProviderSummary {
    key: String,
    name: String,
    version: String,
    description: String,
    resources: usize,
    template_dir: String,
}

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "resources")]
    resources: usize,
    #[tabled(rename = "description")]
    description: String,
}

impl ProvidersArgs {
    pub async fn run(self, registry: Arc<ProviderRegistry>) -> Result<()> {
        let mut summaries = Vec::new();
        for key in registry.keys().await {
            let registration = registry
                .get(&key)
                .await
                .with_context(|| format!("provider '{key}' disappeared while listing"))?;
            let provider = registration.provider();
            summaries.push(ProviderSummary {
                key,
                name: provider.name().to_string(),
                version: provider.version().to_string(),
                description: provider.description().to_string(),
                resources: provider.resources().count(),
                template_dir: provider.template_directory_path().display().to_string(),
            });
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summaries)
                    .context("failed to serialize providers JSON")?
            );
            return Ok(());
        }

        if summaries.is_empty() {
            println!("No providers registered.");
            return Ok(());
        }

        println!("{} providers registered", summaries.len().to_string().bold());
        let rows: Vec<ProviderRow> = summaries
            .into_iter()
            .map(|s| ProviderRow {
                key: s.key,
                name: s.name,
                version: s.version,
                resources: s.resources,
                description: s.description,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
