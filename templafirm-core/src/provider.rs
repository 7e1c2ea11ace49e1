//! Provider capability and the shared metadata loader.
//!
//! A provider is anything that can say where its template directory lives and
//! hand out the [`ProviderMetaTable`] it was built from. Loading and validation
//! are free functions so concrete providers only decide *where* things are.
//!
//! # Load protocol
//!
//! 1. Read the metadata YAML at `metadata_path`.
//! 2. Parse into the raw shape, rejecting unknown fields.
//! 3. Rebuild every resource with explicit defaults.
//! 4. Check each `template_file_path` exists relative to the metadata file's
//!    directory. Any miss fails the whole load.
//!
//! Providers compiled into the binary skip the filesystem: their metadata is
//! parsed with [`parse_meta_table`] and checked against the embedded set with
//! [`validate_embedded_templates`].

use std::collections::hash_map::Keys;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ProviderError};
use crate::types::{ProviderMetaTable, RawProviderMeta, ResourceTemplate};

/// Template files compiled into the binary as `(relative path, body)` pairs.
pub type EmbeddedTemplates = &'static [(&'static str, &'static str)];

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A named collection of templatable resources.
pub trait Provider: Send + Sync {
    /// Directory the rendering engine is rooted at.
    fn template_directory_path(&self) -> PathBuf;

    /// The validated meta table this provider was constructed from.
    fn meta_table(&self) -> &ProviderMetaTable;

    fn name(&self) -> &str {
        &self.meta_table().name
    }

    fn version(&self) -> &str {
        &self.meta_table().version
    }

    fn description(&self) -> &str {
        &self.meta_table().description
    }

    /// View over the resource keys, borrowed from the live mapping.
    fn resources(&self) -> Keys<'_, String, ResourceTemplate> {
        self.meta_table().template_mapping.keys()
    }

    fn contains(&self, resource_key: &str) -> bool {
        self.meta_table().contains(resource_key)
    }

    fn resource(&self, resource_key: &str) -> Result<&ResourceTemplate, ProviderError> {
        self.meta_table().get(resource_key)
    }

    /// Template bodies bundled with the provider, if it does not read them
    /// from [`template_directory_path`](Provider::template_directory_path).
    fn embedded_templates(&self) -> Option<EmbeddedTemplates> {
        None
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate the meta table at `metadata_path`.
pub fn load_meta_table(metadata_path: &Path) -> Result<ProviderMetaTable, ProviderError> {
    let contents =
        std::fs::read_to_string(metadata_path).map_err(|e| io_err(metadata_path, e))?;
    let table = parse_meta_table(&contents, metadata_path)?;

    let base_dir = metadata_path.parent().unwrap_or_else(|| Path::new(""));
    validate_template_files(&table, base_dir)?;

    tracing::debug!(
        provider = %table.name,
        version = %table.version,
        resources = table.template_mapping.len(),
        path = %metadata_path.display(),
        "loaded provider metadata"
    );
    Ok(table)
}

/// Parse metadata `contents` and rebuild it with explicit defaults.
///
/// `origin` only labels parse errors; nothing is read from it.
pub fn parse_meta_table(contents: &str, origin: &Path) -> Result<ProviderMetaTable, ProviderError> {
    let raw: RawProviderMeta =
        serde_yaml::from_str(contents).map_err(|source| ProviderError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
    Ok(ProviderMetaTable::from_raw(raw))
}

/// Every resource's template file must exist under `base_dir`.
///
/// Resources are checked in key order so the reported miss is deterministic.
pub fn validate_template_files(
    table: &ProviderMetaTable,
    base_dir: &Path,
) -> Result<(), ProviderError> {
    check_templates(table, base_dir, |resource| {
        base_dir.join(&resource.template_file_path).is_file()
    })
}

/// Every resource's template file must be part of `templates`.
///
/// Misses are reported as paths under `base_dir`.
pub fn validate_embedded_templates(
    table: &ProviderMetaTable,
    base_dir: &Path,
    templates: EmbeddedTemplates,
) -> Result<(), ProviderError> {
    check_templates(table, base_dir, |resource| {
        templates
            .iter()
            .any(|(path, _)| *path == resource.template_file_path)
    })
}

fn check_templates(
    table: &ProviderMetaTable,
    base_dir: &Path,
    exists: impl Fn(&ResourceTemplate) -> bool,
) -> Result<(), ProviderError> {
    let mut keys: Vec<&String> = table.template_mapping.keys().collect();
    keys.sort();
    for key in keys {
        let resource = &table.template_mapping[key];
        if !exists(resource) {
            let path = base_dir.join(&resource.template_file_path);
            return Err(ProviderError::MissingTemplateFile {
                resource: key.clone(),
                path,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FileProvider
// ---------------------------------------------------------------------------

/// Provider backed by an arbitrary metadata file.
///
/// The template directory is the directory containing the metadata file.
#[derive(Debug, Clone)]
pub struct FileProvider {
    metadata_path: PathBuf,
    meta: ProviderMetaTable,
}

impl FileProvider {
    pub fn from_metadata(metadata_path: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let metadata_path = metadata_path.into();
        let meta = load_meta_table(&metadata_path)?;
        Ok(Self {
            metadata_path,
            meta,
        })
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }
}

impl Provider for FileProvider {
    fn template_directory_path(&self) -> PathBuf {
        self.metadata_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn meta_table(&self) -> &ProviderMetaTable {
        &self.meta
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
