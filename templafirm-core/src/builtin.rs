//! Providers shipped with templafirm.
//!
//! # Layout
//!
//! | Kind | Directory        | Metadata file            |
//! |------|------------------|--------------------------|
//! | Gke  | `templates/gke/` | `gke_provider_meta.yaml` |
//! | Eai  | `templates/eai/` | `eai_provider_meta.yaml` |
//!
//! Metadata and template bodies are compiled in with `include_str!`, so the
//! binary needs no source checkout. Setting `TEMPLAFIRM_TEMPLATES_DIR` loads
//! the same layout from disk instead.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ProviderError;
use crate::provider::{
    load_meta_table, parse_meta_table, validate_embedded_templates, EmbeddedTemplates, Provider,
};
use crate::types::ProviderMetaTable;

/// Environment variable pointing at an on-disk templates root.
pub const TEMPLATES_DIR_ENV: &str = "TEMPLAFIRM_TEMPLATES_DIR";

/// Directory label reported by embedded providers. Never read.
pub const EMBEDDED_ROOT: &str = "builtin";

/// On-disk templates root from `TEMPLAFIRM_TEMPLATES_DIR`, if set.
pub fn templates_dir_override() -> Option<PathBuf> {
    std::env::var_os(TEMPLATES_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

// ---------------------------------------------------------------------------
// Embedded sources
// ---------------------------------------------------------------------------

const GKE_META: &str = include_str!("../templates/gke/gke_provider_meta.yaml");
const GKE_TEMPLATES: EmbeddedTemplates = &[(
    "node_pools/mrdma_node_pool.tera",
    include_str!("../templates/gke/node_pools/mrdma_node_pool.tera"),
)];

const EAI_META: &str = include_str!("../templates/eai/eai_provider_meta.yaml");
const EAI_TEMPLATES: EmbeddedTemplates = &[(
    "eai_mrdma_node_pool.tera",
    include_str!("../templates/eai/eai_mrdma_node_pool.tera"),
)];

// ---------------------------------------------------------------------------
// BuiltinKind
// ---------------------------------------------------------------------------

/// All providers bundled with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Gke,
    Eai,
}

impl BuiltinKind {
    /// All built-in kinds in registration order.
    pub fn all() -> &'static [BuiltinKind] {
        &[BuiltinKind::Gke, BuiltinKind::Eai]
    }

    /// Registry key the provider is seeded under.
    pub fn key(&self) -> &'static str {
        match self {
            BuiltinKind::Gke => "gke",
            BuiltinKind::Eai => "eai",
        }
    }

    pub fn metadata_file_name(&self) -> &'static str {
        match self {
            BuiltinKind::Gke => "gke_provider_meta.yaml",
            BuiltinKind::Eai => "eai_provider_meta.yaml",
        }
    }

    pub fn template_directory(&self, root: &Path) -> PathBuf {
        root.join(self.key())
    }

    fn embedded_metadata(&self) -> &'static str {
        match self {
            BuiltinKind::Gke => GKE_META,
            BuiltinKind::Eai => EAI_META,
        }
    }

    fn embedded_templates(&self) -> EmbeddedTemplates {
        match self {
            BuiltinKind::Gke => GKE_TEMPLATES,
            BuiltinKind::Eai => EAI_TEMPLATES,
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// BuiltinProvider
// ---------------------------------------------------------------------------

/// A bundled provider, backed either by the compiled-in copy or by a
/// templates root on disk.
#[derive(Debug, Clone)]
pub struct BuiltinProvider {
    kind: BuiltinKind,
    template_dir: PathBuf,
    meta: ProviderMetaTable,
    embedded: Option<EmbeddedTemplates>,
}

impl BuiltinProvider {
    /// Load `kind` from `TEMPLAFIRM_TEMPLATES_DIR` when set, otherwise from
    /// the compiled-in copy.
    pub fn load(kind: BuiltinKind) -> Result<Self, ProviderError> {
        match templates_dir_override() {
            Some(root) => Self::load_from(kind, &root),
            None => Self::embedded(kind),
        }
    }

    /// The compiled-in copy of `kind`.
    pub fn embedded(kind: BuiltinKind) -> Result<Self, ProviderError> {
        let template_dir = kind.template_directory(Path::new(EMBEDDED_ROOT));
        let templates = kind.embedded_templates();
        let meta = parse_meta_table(
            kind.embedded_metadata(),
            &template_dir.join(kind.metadata_file_name()),
        )?;
        validate_embedded_templates(&meta, &template_dir, templates)?;
        Ok(Self {
            kind,
            template_dir,
            meta,
            embedded: Some(templates),
        })
    }

    /// Load `kind` from an explicit templates root on disk.
    pub fn load_from(kind: BuiltinKind, root: &Path) -> Result<Self, ProviderError> {
        let template_dir = kind.template_directory(root);
        let meta = load_meta_table(&template_dir.join(kind.metadata_file_name()))?;
        Ok(Self {
            kind,
            template_dir,
            meta,
            embedded: None,
        })
    }

    pub fn kind(&self) -> BuiltinKind {
        self.kind
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }
}

impl Provider for BuiltinProvider {
    fn template_directory_path(&self) -> PathBuf {
        self.template_dir.clone()
    }

    fn meta_table(&self) -> &ProviderMetaTable {
        &self.meta
    }

    fn embedded_templates(&self) -> Option<EmbeddedTemplates> {
        self.embedded
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn source_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
    }

    #[test]
    fn every_builtin_loads_from_disk() {
        for kind in BuiltinKind::all() {
            let provider = BuiltinProvider::load_from(*kind, &source_root())
                .unwrap_or_else(|e| panic!("{kind} failed to load: {e}"));
            assert_eq!(provider.name(), kind.key());
            assert_eq!(provider.version(), "0.0.1");
            assert_eq!(provider.kind(), *kind);
            assert!(!provider.is_embedded());
            assert!(provider.embedded_templates().is_none());
        }
    }

    #[test]
    fn embedded_copy_matches_disk() {
        for kind in BuiltinKind::all() {
            let embedded = BuiltinProvider::embedded(*kind).expect("embedded");
            let on_disk = BuiltinProvider::load_from(*kind, &source_root()).expect("disk");
            assert!(embedded.is_embedded());
            assert_eq!(embedded.meta_table(), on_disk.meta_table());
            assert_eq!(
                embedded.template_directory_path(),
                Path::new(EMBEDDED_ROOT).join(kind.key())
            );

            for (path, body) in embedded.embedded_templates().unwrap() {
                let disk_body =
                    std::fs::read_to_string(on_disk.template_directory_path().join(path))
                        .expect("template on disk");
                assert_eq!(*body, disk_body, "{kind}: {path} drifted");
            }
        }
    }

    #[test]
    fn template_directory_is_keyed_by_kind() {
        let root = PathBuf::from("/opt/templafirm");
        assert_eq!(
            BuiltinKind::Gke.template_directory(&root),
            PathBuf::from("/opt/templafirm/gke")
        );
    }

    #[test]
    fn missing_root_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(BuiltinProvider::load_from(BuiltinKind::Eai, tmp.path()).is_err());
    }
}
