//! Output file handling for rendered resources.
//!
//! Writes happen after the provider lock is released. The extension check is
//! a pure metadata comparison: the output path's final extension (with its
//! leading dot) must equal the resource's declared `file_extension`.

use std::path::{Path, PathBuf};

use templafirm_renderer::RenderError;

use crate::error::{io_err, TemplaterError};

// ---------------------------------------------------------------------------
// Write outcome
// ---------------------------------------------------------------------------

/// Outcome of a `render_to_file` call that did not raise an error.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The rendered text was written; `overwritten` if a file already existed.
    Written { path: PathBuf, overwritten: bool },
    /// The engine failed, nothing was written.
    RenderFailed { error: RenderError },
    /// The output path's extension differs from the resource's, nothing was written.
    ExtensionMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }
}

// ---------------------------------------------------------------------------
// Extension check
// ---------------------------------------------------------------------------

/// Final extension of `path` with its leading dot, or `""` if it has none.
pub fn output_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

pub fn extension_matches(path: &Path, expected: &str) -> bool {
    output_extension(path) == expected
}

// ---------------------------------------------------------------------------
// write_output
// ---------------------------------------------------------------------------

/// Write `content` to `path`, truncating whatever was there.
///
/// Parent directories are created as needed. Returns whether an existing file
/// was replaced.
pub(crate) async fn write_output(path: &Path, content: &str) -> Result<bool, TemplaterError> {
    let overwritten = tokio::fs::try_exists(path)
        .await
        .map_err(|e| io_err(path, e))?;
    if overwritten {
        tracing::warn!(path = %path.display(), "output file exists, overwriting");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_err(parent, e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| io_err(path, e))?;

    tracing::info!(path = %path.display(), bytes = content.len(), "wrote rendered template");
    Ok(overwritten)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("out.tf", ".tf")]
    #[case("/tmp/dir/out.txt", ".txt")]
    #[case("archive.tar.gz", ".gz")]
    #[case("Makefile", "")]
    #[case(".tf", "")]
    fn extension_of(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(output_extension(Path::new(path)), expected);
    }

    #[test]
    fn mismatch_is_detected() {
        assert!(extension_matches(Path::new("main.tf"), ".tf"));
        assert!(!extension_matches(Path::new("main.txt"), ".tf"));
        assert!(!extension_matches(Path::new("main"), ".tf"));
    }

    #[tokio::test]
    async fn first_write_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("main.tf");
        let overwritten = write_output(&path, "resource {}").await.unwrap();
        assert!(!overwritten);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "resource {}");
    }

    #[tokio::test]
    async fn existing_file_is_truncated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("main.tf");
        std::fs::write(&path, "a much longer previous body").unwrap();
        let overwritten = write_output(&path, "short").await.unwrap();
        assert!(overwritten);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[tokio::test]
    async fn unwritable_target_is_io_error() {
        let tmp = TempDir::new().unwrap();
        // A directory cannot be written as a file.
        let err = write_output(tmp.path(), "x").await.unwrap_err();
        assert!(matches!(err, TemplaterError::Io { .. }));
    }
}
