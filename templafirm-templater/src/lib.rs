//! # templafirm-templater
//!
//! Provider registry and render coordinator.
//!
//! Build a [`ProviderRegistry`] (usually seeded with the built-in providers),
//! share it through an `Arc`, and create one [`Templater`] per caller that
//! needs its own active provider. Renders against one provider are serialised
//! by that provider's lock; lock waits are bounded by
//! [`TemplaterConfig::lock_timeout`].

pub mod config;
pub mod error;
pub mod registry;
pub mod templater;
pub mod writer;

pub use config::{TemplaterConfig, DEFAULT_LOCK_TIMEOUT, DEFAULT_PROVIDER};
pub use error::TemplaterError;
pub use registry::{ProviderRegistration, ProviderRegistry};
pub use templater::{RenderOutcome, Templater};
pub use writer::{extension_matches, output_extension, WriteOutcome};
