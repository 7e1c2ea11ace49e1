//! Error types for templafirm-templater.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use templafirm_core::ProviderError;

/// Errors surfaced to callers of the registry and [`crate::Templater`].
///
/// Engine-level render failures are not listed here; they are reported
/// through [`crate::RenderOutcome::Failed`] instead.
#[derive(Debug, Error)]
pub enum TemplaterError {
    /// No registration exists under the requested key.
    #[error("provider '{provider}' is not registered")]
    ProviderNotFound { provider: String },

    /// The active provider has no resource under the requested key.
    #[error("resource '{resource}' is not registered in provider '{provider}'")]
    ResourceNotFound { provider: String, resource: String },

    /// The provider lock could not be acquired within the configured window.
    #[error("timed out acquiring lock for provider '{provider}' after {timeout:?}")]
    LockTimeout { provider: String, timeout: Duration },

    /// Loading a provider failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// I/O error while writing rendered output.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking render task panicked or was cancelled.
    #[error("render task join error: {0}")]
    TaskJoin(String),
}

/// Convenience constructor for [`TemplaterError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplaterError {
    TemplaterError::Io {
        path: path.into(),
        source,
    }
}
