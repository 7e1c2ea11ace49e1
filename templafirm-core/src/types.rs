//! Meta table model for providers and their templatable resources.
//!
//! Metadata files are parsed into the `Raw*` shapes first and then rebuilt
//! field by field, so that omitted fields resolve to the documented defaults
//! rather than whatever a generic coercion would produce.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Extension assumed for rendered output when a resource does not declare one.
pub const DEFAULT_FILE_EXTENSION: &str = ".tf";

// ---------------------------------------------------------------------------
// ResourceTemplate
// ---------------------------------------------------------------------------

/// Descriptor for one templatable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    pub name: String,
    pub version: String,
    /// Path of the template file, relative to the provider's template directory.
    pub template_file_path: String,
    pub description: String,
    /// Extension (with leading dot) that rendered output files must carry.
    pub file_extension: String,
    /// Declared input names. Informational only; not enforced at render time.
    pub template_inputs: BTreeSet<String>,
}

impl ResourceTemplate {
    /// Build a resource with every optional field at its default.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        template_file_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            template_file_path: template_file_path.into(),
            description: String::new(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            template_inputs: BTreeSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_file_extension(mut self, file_extension: impl Into<String>) -> Self {
        self.file_extension = file_extension.into();
        self
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Rebuild a resource from its raw metadata entry, applying defaults.
    pub(crate) fn from_raw(raw: RawResourceTemplate) -> Self {
        let mut resource = ResourceTemplate::new(raw.name, raw.version, raw.template_file_path);
        if let Some(description) = raw.description {
            resource.description = description;
        }
        if let Some(file_extension) = raw.file_extension {
            resource.file_extension = file_extension;
        }
        if let Some(inputs) = raw.template_inputs {
            resource.template_inputs = inputs.into_iter().collect();
        }
        resource
    }
}

impl fmt::Display for ResourceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

// ---------------------------------------------------------------------------
// ProviderMetaTable
// ---------------------------------------------------------------------------

/// Descriptor for an entire provider: identity plus its resource mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetaTable {
    pub name: String,
    pub version: String,
    pub description: String,
    pub template_mapping: HashMap<String, ResourceTemplate>,
}

impl ProviderMetaTable {
    pub fn contains(&self, resource_key: &str) -> bool {
        self.template_mapping.contains_key(resource_key)
    }

    /// Keyed lookup; `ResourceNotFound` on a miss.
    pub fn get(&self, resource_key: &str) -> Result<&ResourceTemplate, ProviderError> {
        self.template_mapping
            .get(resource_key)
            .ok_or_else(|| ProviderError::ResourceNotFound {
                provider: self.name.clone(),
                resource: resource_key.to_string(),
            })
    }

    pub(crate) fn from_raw(raw: RawProviderMeta) -> Self {
        let template_mapping = raw
            .template_mapping
            .into_iter()
            .map(|(key, entry)| (key, ResourceTemplate::from_raw(entry)))
            .collect();
        Self {
            name: raw.name,
            version: raw.version,
            description: raw.description.unwrap_or_default(),
            template_mapping,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw metadata shapes
// ---------------------------------------------------------------------------

/// A resource entry exactly as it appears in a metadata file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawResourceTemplate {
    pub name: String,
    pub version: String,
    pub template_file_path: String,
    pub description: Option<String>,
    pub file_extension: Option<String>,
    /// Lists and sets both arrive as sequences; duplicates collapse on rebuild.
    pub template_inputs: Option<Vec<String>>,
}

/// A provider metadata document exactly as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawProviderMeta {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    #[serde(default)]
    pub template_mapping: HashMap<String, RawResourceTemplate>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
