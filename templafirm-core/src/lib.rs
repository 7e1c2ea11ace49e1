//! Templafirm core library: meta table model, provider loading, errors.
//!
//! Public API surface:
//! - [`types`]: [`ResourceTemplate`] and [`ProviderMetaTable`]
//! - [`provider`]: the [`Provider`] capability, loader and [`FileProvider`]
//! - [`builtin`]: providers bundled under `templates/`
//! - [`error`]: [`ProviderError`]

pub mod builtin;
pub mod error;
pub mod provider;
pub mod types;

pub use builtin::{
    templates_dir_override, BuiltinKind, BuiltinProvider, EMBEDDED_ROOT, TEMPLATES_DIR_ENV,
};
pub use error::ProviderError;
pub use provider::{
    load_meta_table, parse_meta_table, validate_embedded_templates, validate_template_files,
    EmbeddedTemplates, FileProvider, Provider,
};
pub use types::{ProviderMetaTable, ResourceTemplate, DEFAULT_FILE_EXTENSION};
