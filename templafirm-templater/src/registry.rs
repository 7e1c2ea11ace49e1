//! Process-wide provider registry.
//!
//! Maps a provider key to a [`ProviderRegistration`]: the provider itself plus
//! a Tera engine rooted at its template directory, guarded by a per-provider
//! mutex. The registry is an explicit value; share it between templaters with
//! an `Arc`.
//!
//! # Overwrite protocol
//!
//! Registering an existing key first waits until the displaced registration's
//! engine lock is free, then swaps in the new registration and logs a warning.
//! The wait happens outside the map lock, so lookups of every provider keep
//! working meanwhile. If the key changed hands during the wait, the wait
//! starts over on the newer registration. Templaters that activated the old
//! registration keep using it until they call `activate` again.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use templafirm_core::{BuiltinKind, BuiltinProvider, Provider, ProviderError};
use templafirm_renderer::TemplateEngine;

use crate::error::TemplaterError;

// ---------------------------------------------------------------------------
// ProviderRegistration
// ---------------------------------------------------------------------------

/// A provider bound to its own engine and lock.
pub struct ProviderRegistration {
    key: String,
    provider: Arc<dyn Provider>,
    engine: Arc<Mutex<TemplateEngine>>,
}

impl ProviderRegistration {
    /// Bind `provider` to a fresh engine rooted at its template directory.
    pub fn new(key: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        let engine = TemplateEngine::for_provider(provider.as_ref());
        Self {
            key: key.into(),
            provider,
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Key this registration was stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// The engine together with the mutex that serialises its use.
    pub fn engine(&self) -> &Arc<Mutex<TemplateEngine>> {
        &self.engine
    }

    /// Whether a render currently holds this provider's lock.
    pub fn is_locked(&self) -> bool {
        self.engine.try_lock().is_err()
    }
}

impl fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("key", &self.key)
            .field("provider", &self.provider.name())
            .field("version", &self.provider.version())
            .field("template_dir", &self.provider.template_directory_path())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

/// Mapping from provider key to its registration.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<ProviderRegistration>>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with every built-in provider, compiled-in unless
    /// `TEMPLAFIRM_TEMPLATES_DIR` is set.
    pub fn with_builtin_providers() -> Result<Self, TemplaterError> {
        Self::seeded(BuiltinProvider::load)
    }

    /// Like [`with_builtin_providers`](Self::with_builtin_providers), reading
    /// the built-ins from an explicit templates root.
    pub fn with_builtin_providers_from(root: &Path) -> Result<Self, TemplaterError> {
        Self::seeded(|kind| BuiltinProvider::load_from(kind, root))
    }

    fn seeded<F>(load: F) -> Result<Self, TemplaterError>
    where
        F: Fn(BuiltinKind) -> Result<BuiltinProvider, ProviderError>,
    {
        let mut providers = HashMap::new();
        for kind in BuiltinKind::all() {
            let provider: Arc<dyn Provider> = Arc::new(load(*kind)?);
            let registration = ProviderRegistration::new(kind.key(), provider);
            providers.insert(kind.key().to_string(), Arc::new(registration));
        }
        Ok(Self {
            providers: RwLock::new(providers),
        })
    }

    /// Register `provider` under `key`, replacing any previous registration.
    ///
    /// Waits for an in-flight render on the displaced registration to finish.
    /// Other lookups proceed during the wait. Calling this while the same task
    /// holds that registration's lock never returns.
    pub async fn register<P>(&self, key: impl Into<String>, provider: P) -> Arc<ProviderRegistration>
    where
        P: Provider + 'static,
    {
        self.register_shared(key, Arc::new(provider)).await
    }

    /// [`register`](Self::register) for an already shared provider.
    pub async fn register_shared(
        &self,
        key: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Arc<ProviderRegistration> {
        let key = key.into();
        let registration = Arc::new(ProviderRegistration::new(key.clone(), provider));

        loop {
            let previous = self.providers.read().await.get(&key).cloned();
            // Held across the swap.
            let _drained = match &previous {
                Some(previous) => Some(previous.engine.clone().lock_owned().await),
                None => None,
            };

            let mut providers = self.providers.write().await;
            let unchanged = match (&previous, providers.get(&key)) {
                (None, None) => true,
                (Some(previous), Some(current)) => Arc::ptr_eq(previous, current),
                _ => false,
            };
            if !unchanged {
                continue;
            }
            if previous.is_some() {
                tracing::warn!(provider = %key, "overwriting previous registration of provider");
            }
            providers.insert(key.clone(), registration.clone());
            break;
        }
        tracing::debug!(
            provider = %key,
            template_dir = %registration.provider.template_directory_path().display(),
            "registered provider"
        );
        registration
    }

    /// Registration stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Arc<ProviderRegistration>, TemplaterError> {
        self.providers
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| TemplaterError::ProviderNotFound {
                provider: key.to_string(),
            })
    }

    /// Sorted snapshot of registered keys.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.providers.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.providers.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.providers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.providers.read().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use templafirm_core::FileProvider;
    use tempfile::TempDir;

    fn local_provider(dir: &Path, name: &str) -> FileProvider {
        let meta = dir.join(format!("{name}_meta.yaml"));
        std::fs::write(
            &meta,
            format!(
                "name: {name}\nversion: 0.0.1\ntemplate_mapping:\n  greet:\n    name: greet\n    version: 0.0.1\n    template_file_path: greet.tera\n"
            ),
        )
        .unwrap();
        std::fs::write(dir.join("greet.tera"), "hello {{ name }}").unwrap();
        FileProvider::from_metadata(meta).unwrap()
    }

    #[tokio::test]
    async fn builtin_registry_has_gke_and_eai() {
        let registry = ProviderRegistry::with_builtin_providers().expect("builtins");
        assert_eq!(registry.keys().await, vec!["eai", "gke"]);
        assert!(registry.contains("gke").await);
        assert_eq!(registry.get("gke").await.unwrap().provider().name(), "gke");
    }

    #[tokio::test]
    async fn get_is_idempotent() {
        let registry = ProviderRegistry::with_builtin_providers().expect("builtins");
        let a = registry.get("gke").await.unwrap();
        let b = registry.get("gke").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty().await);
        let err = registry.get("nope").await.unwrap_err();
        assert!(matches!(err, TemplaterError::ProviderNotFound { .. }));
    }

    #[tokio::test]
    async fn overwrite_replaces_registration() {
        let tmp = TempDir::new().unwrap();
        let registry = ProviderRegistry::new();
        let first = registry.register("local", local_provider(tmp.path(), "one")).await;
        let second = registry.register("local", local_provider(tmp.path(), "two")).await;

        let current = registry.get("local").await.unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert!(!Arc::ptr_eq(&current, &first));
        assert_eq!(current.provider().name(), "two");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn overwrite_waits_for_held_lock() {
        let tmp = TempDir::new().unwrap();
        let registry = Arc::new(ProviderRegistry::new());
        let first = registry.register("local", local_provider(tmp.path(), "one")).await;

        let guard = first.engine().clone().lock_owned().await;
        assert!(first.is_locked());

        let replacing = {
            let registry = registry.clone();
            let provider = local_provider(tmp.path(), "two");
            tokio::spawn(async move { registry.register("local", provider).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!replacing.is_finished(), "overwrite must wait for the held lock");

        drop(guard);
        let second = replacing.await.expect("join");
        assert_eq!(second.provider().name(), "two");
        assert_eq!(registry.get("local").await.unwrap().provider().name(), "two");
    }

    #[tokio::test]
    async fn lookups_proceed_while_overwrite_waits() {
        let tmp = TempDir::new().unwrap();
        let registry = Arc::new(ProviderRegistry::new());
        let alpha = registry.register("alpha", local_provider(tmp.path(), "alpha")).await;
        registry.register("beta", local_provider(tmp.path(), "beta")).await;

        let guard = alpha.engine().clone().lock_owned().await;
        let replacing = {
            let registry = registry.clone();
            let provider = local_provider(tmp.path(), "alpha2");
            tokio::spawn(async move { registry.register("alpha", provider).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!replacing.is_finished());

        // Other providers and the waiting key itself stay readable.
        let within = Duration::from_secs(1);
        let beta = tokio::time::timeout(within, registry.get("beta"))
            .await
            .expect("get(beta) blocked by pending overwrite")
            .unwrap();
        assert_eq!(beta.provider().name(), "beta");
        let keys = tokio::time::timeout(within, registry.keys())
            .await
            .expect("keys() blocked by pending overwrite");
        assert_eq!(keys, vec!["alpha", "beta"]);
        let current = tokio::time::timeout(within, registry.get("alpha"))
            .await
            .expect("lock holder blocked on its own registry")
            .unwrap();
        assert!(Arc::ptr_eq(&current, &alpha));

        drop(guard);
        let replaced = replacing.await.expect("join");
        assert_eq!(replaced.provider().name(), "alpha2");
    }

    #[tokio::test]
    async fn concurrent_overwrites_of_one_key_both_land() {
        let tmp = TempDir::new().unwrap();
        let registry = Arc::new(ProviderRegistry::new());
        let first = registry.register("local", local_provider(tmp.path(), "one")).await;
        let guard = first.engine().clone().lock_owned().await;

        let spawn_register = |name: &'static str| {
            let registry = registry.clone();
            let provider = local_provider(tmp.path(), name);
            tokio::spawn(async move { registry.register("local", provider).await })
        };
        let a = spawn_register("two");
        let b = spawn_register("three");
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        let a = a.await.expect("join a");
        let b = b.await.expect("join b");
        let current = registry.get("local").await.unwrap();
        assert!(Arc::ptr_eq(&current, &a) || Arc::ptr_eq(&current, &b));
        assert_eq!(registry.len().await, 1);
    }
}
