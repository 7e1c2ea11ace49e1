//! Render coordinator.
//!
//! A [`Templater`] targets one *active* registration from a shared
//! [`ProviderRegistry`] and serialises renders through that provider's lock:
//!
//! ```text
//! Idle -> LockAcquiring -> LockHeld+Rendering -> Idle
//!              |                   |
//!         LockTimeout        RenderOutcome::Failed
//! ```
//!
//! The lock is an owned guard, so it is released on every exit path,
//! including a panic inside the engine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;

use templafirm_core::{Provider, ResourceTemplate};
use templafirm_renderer::{RenderError, TemplateEngine, TemplateInputs};

use crate::config::TemplaterConfig;
use crate::error::TemplaterError;
use crate::registry::{ProviderRegistration, ProviderRegistry};
use crate::writer::{extension_matches, output_extension, write_output, WriteOutcome};

// ---------------------------------------------------------------------------
// RenderOutcome
// ---------------------------------------------------------------------------

/// Result of a render that got as far as invoking the engine.
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(String),
    /// The engine rejected the template or its inputs. Already logged.
    Failed(RenderError),
}

impl RenderOutcome {
    /// Rendered text, `None` if the engine failed.
    pub fn text(&self) -> Option<&str> {
        match self {
            RenderOutcome::Rendered(text) => Some(text),
            RenderOutcome::Failed(_) => None,
        }
    }

    /// Rendered text, or an empty string if the engine failed.
    ///
    /// Indistinguishable from a template that legitimately renders empty.
    pub fn into_text_or_empty(self) -> String {
        match self {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::Failed(_) => String::new(),
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }

    pub fn error(&self) -> Option<&RenderError> {
        match self {
            RenderOutcome::Rendered(_) => None,
            RenderOutcome::Failed(err) => Some(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Templater
// ---------------------------------------------------------------------------

/// Coordinator holding an active provider and rendering against it.
///
/// Many templaters may share one registry; each tracks its own active
/// provider. Two renders against the same provider never overlap, renders
/// against different providers run independently.
#[derive(Debug)]
pub struct Templater {
    registry: Arc<ProviderRegistry>,
    active: Arc<ProviderRegistration>,
    lock_timeout: Duration,
}

impl Templater {
    /// Create a templater over `registry`, activating `config.default_provider`.
    pub async fn new(
        registry: Arc<ProviderRegistry>,
        config: TemplaterConfig,
    ) -> Result<Self, TemplaterError> {
        let active = registry.get(&config.default_provider).await?;
        Ok(Self {
            registry,
            active,
            lock_timeout: config.lock_timeout,
        })
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub fn active(&self) -> &Arc<ProviderRegistration> {
        &self.active
    }

    pub fn active_provider_key(&self) -> &str {
        self.active.key()
    }

    /// Make the registration under `provider_key` the active one.
    pub async fn activate(&mut self, provider_key: &str) -> Result<(), TemplaterError> {
        self.active = self.registry.get(provider_key).await?;
        tracing::debug!(provider = %provider_key, "activated provider");
        Ok(())
    }

    /// Register `provider` in the shared registry. Does not change the active provider.
    pub async fn register_provider<P>(
        &self,
        provider_key: &str,
        provider: P,
    ) -> Arc<ProviderRegistration>
    where
        P: Provider + 'static,
    {
        self.registry.register(provider_key, provider).await
    }

    /// Registration under `provider_key`.
    pub async fn provider(
        &self,
        provider_key: &str,
    ) -> Result<Arc<ProviderRegistration>, TemplaterError> {
        self.registry.get(provider_key).await
    }

    /// Sorted keys of every registered provider.
    pub async fn list_providers(&self) -> Vec<String> {
        self.registry.keys().await
    }

    /// Sorted resource keys of the provider under `provider_key`.
    pub async fn list_templates(&self, provider_key: &str) -> Result<Vec<String>, TemplaterError> {
        let registration = self.registry.get(provider_key).await?;
        let mut keys: Vec<String> = registration.provider().resources().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Resource `resource_name` of the active provider.
    fn active_resource(&self, resource_name: &str) -> Result<&ResourceTemplate, TemplaterError> {
        let provider = self.active.provider();
        provider
            .resource(resource_name)
            .map_err(|_| TemplaterError::ResourceNotFound {
                provider: provider.name().to_string(),
                resource: resource_name.to_string(),
            })
    }

    /// Acquire the active provider's lock, waiting at most `lock_timeout`.
    ///
    /// The lock is released when the returned guard is dropped.
    pub async fn acquire_lock(&self) -> Result<OwnedMutexGuard<TemplateEngine>, TemplaterError> {
        let engine = self.active.engine().clone();
        match tokio::time::timeout(self.lock_timeout, engine.lock_owned()).await {
            Ok(guard) => {
                tracing::debug!(provider = %self.active.key(), "provider lock acquired");
                Ok(guard)
            }
            Err(_) => {
                tracing::warn!(
                    provider = %self.active.key(),
                    timeout = ?self.lock_timeout,
                    "timed out waiting for provider lock"
                );
                Err(TemplaterError::LockTimeout {
                    provider: self.active.key().to_string(),
                    timeout: self.lock_timeout,
                })
            }
        }
    }

    /// Render `resource_name` from the active provider with `inputs`.
    ///
    /// Unknown resources and lock timeouts are errors. Engine failures are
    /// logged and returned as [`RenderOutcome::Failed`]. Inputs are not checked
    /// against the resource's declared inputs.
    pub async fn render(
        &self,
        resource_name: &str,
        inputs: &TemplateInputs,
    ) -> Result<RenderOutcome, TemplaterError> {
        let provider_key = self.active.key().to_string();
        let resource = self.active_resource(resource_name)?.clone();

        let mut engine = self.acquire_lock().await?;
        let inputs = inputs.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            let result = engine.render_resource(&resource, &inputs);
            drop(engine);
            result
        })
        .await
        .map_err(|err| TemplaterError::TaskJoin(err.to_string()));
        tracing::debug!(provider = %provider_key, "released provider lock");

        match rendered? {
            Ok(text) => Ok(RenderOutcome::Rendered(text)),
            Err(error) => {
                tracing::error!(
                    provider = %provider_key,
                    resource = %resource_name,
                    error = %error.detail(),
                    "error generating template"
                );
                Ok(RenderOutcome::Failed(error))
            }
        }
    }

    /// Render `resource_name` and write it to `output_path`.
    ///
    /// Nothing is written if the engine fails or if `output_path`'s extension
    /// differs from the resource's `file_extension`; both cases are logged and
    /// reported through [`WriteOutcome`]. An existing file is overwritten.
    pub async fn render_to_file(
        &self,
        output_path: impl AsRef<Path>,
        resource_name: &str,
        inputs: &TemplateInputs,
    ) -> Result<WriteOutcome, TemplaterError> {
        let output_path = output_path.as_ref();
        let text = match self.render(resource_name, inputs).await? {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::Failed(error) => {
                tracing::error!(
                    resource = %resource_name,
                    path = %output_path.display(),
                    "template produced no output, file not written"
                );
                return Ok(WriteOutcome::RenderFailed { error });
            }
        };

        let expected = &self.active_resource(resource_name)?.file_extension;
        if !extension_matches(output_path, expected) {
            let found = output_extension(output_path);
            tracing::error!(
                resource = %resource_name,
                path = %output_path.display(),
                expected = %expected,
                found = %found,
                "output file extension does not match resource, file not written"
            );
            return Ok(WriteOutcome::ExtensionMismatch {
                path: output_path.to_path_buf(),
                expected: expected.clone(),
                found,
            });
        }

        let overwritten = write_output(output_path, &text).await?;
        Ok(WriteOutcome::Written {
            path: output_path.to_path_buf(),
            overwritten,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
