//! `templafirm templates [PROVIDER] [--json]`

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use templafirm_core::Provider;
use templafirm_templater::{ProviderRegistry, Templater, TemplaterConfig, DEFAULT_PROVIDER};

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Provider key to list.
    #[arg(default_value = DEFAULT_PROVIDER)]
    pub provider: String,

    /// Print machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TemplateSummary {
    key: String,
    name: String,
    version: String,
    file_extension: String,
    template_file_path: String,
    template_inputs: Vec<String>,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "resource")]
    key: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "extension")]
    file_extension: String,
    #[tabled(rename = "template")]
    template_file_path: String,
    #[tabled(rename = "inputs")]
    inputs: String,
}

impl TemplatesArgs {
    pub async fn run(self, registry: Arc<ProviderRegistry>) -> Result<()> {
        let config = TemplaterConfig::default().with_default_provider(&self.provider);
        let templater = Templater::new(registry, config)
            .await
            .with_context(|| format!("unknown provider '{}'", self.provider))?;

        let registration = templater.active().clone();
        let provider = registration.provider();
        let mut summaries = Vec::new();
        for key in templater.list_templates(&self.provider).await? {
            let resource = provider.resource(&key)?;
            summaries.push(TemplateSummary {
                key,
                name: resource.name.clone(),
                version: resource.version.clone(),
                file_extension: resource.file_extension.clone(),
                template_file_path: resource.template_file_path.clone(),
                template_inputs: resource.template_inputs.iter().cloned().collect(),
            });
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summaries)
                    .context("failed to serialize templates JSON")?
            );
            return Ok(());
        }

        println!(
            "{} v{} | {} resources",
            provider.name().bold(),
            provider.version(),
            summaries.len()
        );
        if summaries.is_empty() {
            println!("No resource templates declared.");
            return Ok(());
        }

        let rows: Vec<TemplateRow> = summaries
            .into_iter()
            .map(|s| TemplateRow {
                key: s.key,
                version: s.version,
                file_extension: s.file_extension,
                template_file_path: s.template_file_path,
                inputs: if s.template_inputs.is_empty() {
                    "-".bright_black().to_string()
                } else {
                    s.template_inputs.join(", ")
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
