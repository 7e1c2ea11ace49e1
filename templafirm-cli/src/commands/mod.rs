pub mod providers;
pub mod render;
pub mod templates;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};

use templafirm_core::FileProvider;
use templafirm_templater::ProviderRegistry;

/// A `--register KEY=METADATA_PATH` argument.
#[derive(Debug, Clone)]
pub struct Registration {
    pub key: String,
    pub metadata_path: PathBuf,
}

impl FromStr for Registration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, path)) if !key.is_empty() && !path.is_empty() => Ok(Self {
                key: key.to_string(),
                metadata_path: PathBuf::from(path),
            }),
            _ => Err(format!("expected KEY=METADATA_PATH, got '{s}'")),
        }
    }
}

/// Built-in providers plus every `--register` entry, in argument order.
pub async fn build_registry(extra: &[Registration]) -> Result<Arc<ProviderRegistry>> {
    let registry =
        ProviderRegistry::with_builtin_providers().context("failed to load built-in providers")?;
    for entry in extra {
        tracing::debug!(
            provider = %entry.key,
            path = %entry.metadata_path.display(),
            "registering provider from command line"
        );
        let provider = FileProvider::from_metadata(entry.metadata_path.clone()).with_context(|| {
            format!(
                "failed to load provider '{}' from {}",
                entry.key,
                entry.metadata_path.display()
            )
        })?;
        registry.register(entry.key.clone(), provider).await;
    }
    Ok(Arc::new(registry))
}
