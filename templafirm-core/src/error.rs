//! Error types for templafirm-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or querying a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Underlying I/O failure while reading a metadata file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata YAML was malformed or did not match the expected shape.
    #[error("failed to parse provider metadata at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A resource references a template file that is not on disk.
    #[error("template file for resource '{resource}' not found at {path}")]
    MissingTemplateFile { resource: String, path: PathBuf },

    /// The requested resource key is not part of the provider.
    #[error("resource '{resource}' does not exist in provider '{provider}'")]
    ResourceNotFound { provider: String, resource: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ProviderError {
    ProviderError::Io {
        path: path.into(),
        source,
    }
}
