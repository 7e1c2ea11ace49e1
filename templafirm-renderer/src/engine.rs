//! Tera rendering engine rooted at a provider's template directory.
//!
//! Nothing is read at construction. The first render scans every template
//! under the root (or the provider's embedded set) and adds each one that
//! builds, parents and imported macro files first, so `include`, `import` and
//! `extends` between sibling templates resolve. A template that does not
//! parse, or whose parent or macro file is missing, is skipped by the scan
//! and only fails the renders that ask for it.
//!
//! Every addition is built on a copy of the Tera instance and swapped in only
//! on success, so a broken template never leaves state behind. Loading
//! mutates the engine; a shared engine must sit behind a lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tera::{Template, Tera};
use walkdir::WalkDir;

use templafirm_core::{EmbeddedTemplates, Provider, ResourceTemplate};

use crate::context::{to_tera_context, TemplateInputs};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Template path helpers
// ---------------------------------------------------------------------------

/// Normalise a template path to a forward-slash, root-relative name.
///
/// Absolute paths and `..` components are refused.
fn normalize_template_name(root: &Path, template_path: &str) -> Result<String, RenderError> {
    let unified = template_path.replace('\\', "/");
    let mut parts = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RenderError::OutsideRoot {
                    root: root.to_path_buf(),
                    path: template_path.to_string(),
                })
            }
        }
    }
    if parts.is_empty() {
        return Err(RenderError::TemplateNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(parts.join("/"))
}

/// Root-relative, forward-slash name of a file found while walking `root`.
fn relative_name(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

enum Source {
    Directory,
    Embedded(EmbeddedTemplates),
}

/// Tera-based engine for a single template directory.
pub struct TemplateEngine {
    root: PathBuf,
    source: Source,
    tera: Tera,
    loaded: BTreeSet<String>,
    scanned: bool,
}

impl TemplateEngine {
    /// Construct an empty engine reading templates under `root`. Nothing is read yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_source(root.into(), Source::Directory)
    }

    /// Construct an engine over compiled-in templates. `root` is only a label.
    pub fn embedded(root: impl Into<PathBuf>, templates: EmbeddedTemplates) -> Self {
        Self::with_source(root.into(), Source::Embedded(templates))
    }

    /// Engine matching where `provider` keeps its templates.
    pub fn for_provider(provider: &dyn Provider) -> Self {
        let root = provider.template_directory_path();
        match provider.embedded_templates() {
            Some(templates) => Self::embedded(root, templates),
            None => Self::new(root),
        }
    }

    fn with_source(root: PathBuf, source: Source) -> Self {
        TemplateEngine {
            root,
            source,
            tera: Tera::default(),
            loaded: BTreeSet::new(),
            scanned: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.source, Source::Embedded(_))
    }

    /// Whether `template_path` has already been read and parsed.
    pub fn is_loaded(&self, template_path: &str) -> bool {
        normalize_template_name(&self.root, template_path)
            .map(|name| self.loaded.contains(&name))
            .unwrap_or(false)
    }

    /// Names of every template loaded so far, sorted.
    pub fn loaded_templates(&self) -> impl Iterator<Item = &str> {
        self.loaded.iter().map(String::as_str)
    }

    /// Make `filter` available to every template as `name`.
    pub fn register_filter<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        self.tera.register_filter(name, filter);
    }

    /// Resolve and parse `template_path` if it is not loaded yet.
    ///
    /// Returns the normalised template name.
    pub fn load(&mut self, template_path: &str) -> Result<String, RenderError> {
        let name = normalize_template_name(&self.root, template_path)?;
        if self.loaded.contains(&name) {
            return Ok(name);
        }
        if !self.scanned {
            self.scan();
            if self.loaded.contains(&name) {
                return Ok(name);
            }
        }

        // Skipped by the scan or added since; retry it alone for its own error.
        let body = self.read_source(&name)?;
        self.add_checked(&name, &body)?;
        Ok(name)
    }

    /// Render `template_path` with `inputs` as the variable bindings.
    pub fn render(
        &mut self,
        template_path: &str,
        inputs: &TemplateInputs,
    ) -> Result<String, RenderError> {
        let name = self.load(template_path)?;
        let ctx = to_tera_context(inputs)?;
        Ok(self.tera.render(&name, &ctx)?)
    }

    /// Render the template file declared by `resource`.
    pub fn render_resource(
        &mut self,
        resource: &ResourceTemplate,
        inputs: &TemplateInputs,
    ) -> Result<String, RenderError> {
        self.render(&resource.template_file_path, inputs)
    }

    // -- loading ------------------------------------------------------------

    /// Add `name` to a copy of the Tera instance, keeping the copy on success.
    fn add_checked(&mut self, name: &str, body: &str) -> Result<(), RenderError> {
        let mut candidate = self.tera.clone();
        candidate.add_raw_template(name, body)?;
        self.tera = candidate;
        self.loaded.insert(name.to_string());
        tracing::debug!(template = %name, root = %self.root.display(), "loaded template");
        Ok(())
    }

    fn read_source(&self, name: &str) -> Result<String, RenderError> {
        match &self.source {
            Source::Embedded(templates) => templates
                .iter()
                .find(|(path, _)| *path == name)
                .map(|(_, body)| body.to_string())
                .ok_or_else(|| RenderError::TemplateNotFound {
                    path: self.root.join(name),
                }),
            Source::Directory => {
                let file = self.root.join(name);
                if !file.is_file() {
                    return Err(RenderError::TemplateNotFound { path: file });
                }
                std::fs::read_to_string(&file).map_err(|source| RenderError::Io { path: file, source })
            }
        }
    }

    fn collect_sources(&self) -> Vec<(String, String)> {
        match &self.source {
            Source::Embedded(templates) => templates
                .iter()
                .map(|(path, body)| (path.to_string(), body.to_string()))
                .collect(),
            Source::Directory => {
                let mut sources = Vec::new();
                for entry in WalkDir::new(&self.root).sort_by_file_name() {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(err) => {
                            tracing::debug!(root = %self.root.display(), error = %err, "skipping unreadable entry");
                            continue;
                        }
                    };
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let Some(name) = relative_name(&self.root, entry.path()) else {
                        continue;
                    };
                    match std::fs::read_to_string(entry.path()) {
                        Ok(body) => sources.push((name, body)),
                        Err(err) => {
                            tracing::debug!(template = %name, error = %err, "skipping non-text file")
                        }
                    }
                }
                sources
            }
        }
    }

    /// Add every template that builds, dependencies before dependants.
    fn scan(&mut self) {
        self.scanned = true;

        let mut pending: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
        for (name, body) in self.collect_sources() {
            if self.loaded.contains(&name) {
                continue;
            }
            match Template::new(&name, None, &body) {
                Ok(parsed) => {
                    let mut deps: Vec<String> = parsed
                        .imported_macro_files
                        .iter()
                        .map(|(file, _)| file.clone())
                        .collect();
                    deps.extend(parsed.parent.clone());
                    pending.insert(name, (body, deps));
                }
                Err(err) => {
                    tracing::debug!(template = %name, error = %err, "skipping template that does not parse")
                }
            }
        }

        loop {
            let ready: Vec<String> = pending
                .iter()
                .filter(|(_, (_, deps))| deps.iter().all(|dep| self.loaded.contains(dep)))
                .map(|(name, _)| name.clone())
                .collect();
            if ready.is_empty() {
                break;
            }
            for name in ready {
                if let Some((body, _)) = pending.remove(&name) {
                    if let Err(err) = self.add_checked(&name, &body) {
                        tracing::debug!(template = %name, error = %err, "skipping template that does not build");
                    }
                }
            }
        }
        for name in pending.keys() {
            tracing::debug!(template = %name, "skipping template with a missing parent or macro file");
        }

        tracing::debug!(
            root = %self.root.display(),
            templates = self.loaded.len(),
            "scanned templates"
        );
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("root", &self.root)
            .field("embedded", &self.is_embedded())
            .field("scanned", &self.scanned)
            .field("loaded", &self.loaded)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
