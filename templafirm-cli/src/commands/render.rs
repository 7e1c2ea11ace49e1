//! `templafirm render <RESOURCE> [--provider <key>] [--input KEY=VALUE]... [--output <path>]`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use templafirm_renderer::{parse_input_value, TemplateInputs};
use templafirm_templater::{
    ProviderRegistry, RenderOutcome, Templater, TemplaterConfig, WriteOutcome, DEFAULT_PROVIDER,
};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Resource key within the provider (e.g. "mrdma_node_pool").
    pub resource: String,

    /// Provider key to render from.
    #[arg(long, short = 'p', default_value = DEFAULT_PROVIDER)]
    pub provider: String,

    /// Template input as KEY=VALUE. JSON values keep their structure.
    #[arg(long = "input", short = 'i', value_name = "KEY=VALUE", value_parser = parse_input_pair)]
    pub inputs: Vec<(String, serde_json::Value)>,

    /// YAML or JSON mapping of template inputs. `--input` entries win on conflict.
    #[arg(long, value_name = "PATH")]
    pub inputs_file: Option<PathBuf>,

    /// Write the rendered text here instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Seconds to wait for the provider lock.
    #[arg(long, value_name = "SECS", value_parser = parse_lock_timeout)]
    pub lock_timeout: Option<Duration>,
}

impl RenderArgs {
    pub async fn run(self, registry: Arc<ProviderRegistry>) -> Result<()> {
        let mut config = TemplaterConfig::default().with_default_provider(&self.provider);
        if let Some(timeout) = self.lock_timeout {
            config = config.with_lock_timeout(timeout);
        }
        let templater = Templater::new(registry, config)
            .await
            .with_context(|| format!("unknown provider '{}'", self.provider))?;

        let mut inputs = match &self.inputs_file {
            Some(path) => load_inputs_file(path)?,
            None => TemplateInputs::new(),
        };
        inputs.extend(self.inputs);

        match self.output {
            Some(path) => write_to_file(&templater, &path, &self.resource, &inputs).await,
            None => print_to_stdout(&templater, &self.resource, &inputs).await,
        }
    }
}

async fn print_to_stdout(
    templater: &Templater,
    resource: &str,
    inputs: &TemplateInputs,
) -> Result<()> {
    let outcome = templater
        .render(resource, inputs)
        .await
        .with_context(|| format!("failed to render '{resource}'"))?;
    match outcome {
        RenderOutcome::Rendered(text) => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        RenderOutcome::Failed(err) => bail!("failed to render '{resource}': {}", err.detail()),
    }
}

async fn write_to_file(
    templater: &Templater,
    path: &Path,
    resource: &str,
    inputs: &TemplateInputs,
) -> Result<()> {
    let outcome = templater
        .render_to_file(path, resource, inputs)
        .await
        .with_context(|| format!("failed to render '{resource}' to {}", path.display()))?;
    match outcome {
        WriteOutcome::Written { path, overwritten } => {
            let verb = if overwritten { "Overwrote" } else { "Wrote" };
            println!("{} {verb} {}", "✓".green(), path.display());
            Ok(())
        }
        WriteOutcome::RenderFailed { error } => {
            bail!("failed to render '{resource}': {}", error.detail())
        }
        WriteOutcome::ExtensionMismatch {
            path,
            expected,
            found,
        } => bail!(
            "refusing to write {}: resource '{resource}' expects extension '{expected}', found '{found}'",
            path.display()
        ),
    }
}

fn load_inputs_file(path: &Path) -> Result<TemplateInputs> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read inputs file {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(TemplateInputs::new());
    }
    // YAML is a superset of JSON, so one parser covers both.
    serde_yaml::from_str(&raw)
        .with_context(|| format!("inputs file {} is not a mapping of names to values", path.display()))
}

fn parse_input_pair(s: &str) -> std::result::Result<(String, serde_json::Value), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), parse_input_value(value))),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn parse_lock_timeout(s: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("lock timeout must be positive, got '{s}'"));
    }
    Ok(Duration::from_secs_f64(secs))
}
