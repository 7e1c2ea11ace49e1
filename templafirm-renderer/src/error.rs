//! Error types for templafirm-renderer.

use std::error::Error as _;
use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (syntax, undefined variable, bad filter input).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// The template path was absolute or climbed out of the engine root.
    #[error("template path '{path}' escapes template root {root}")]
    OutsideRoot { root: PathBuf, path: String },

    /// The template file does not exist under the engine root.
    #[error("template file not found at {path}")]
    TemplateNotFound { path: PathBuf },

    /// The template file exists but could not be read.
    #[error("failed to read template at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Message including every nested cause.
    ///
    /// Tera keeps the useful part ("Variable `x` not found") in the source
    /// chain, so the top-level `Display` alone is rarely enough for a log line.
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
