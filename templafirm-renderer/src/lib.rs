//! # templafirm-renderer
//!
//! Tera-based template engine bound to one provider's template directory.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use templafirm_renderer::{inputs_from_pairs, TemplateEngine};
//!
//! fn render_greeting() {
//!     let mut engine = TemplateEngine::new("/srv/templates/demo");
//!     let inputs = inputs_from_pairs([("name", "world")]);
//!     match engine.render("greet.tera", &inputs) {
//!         Ok(text) => println!("{text}"),
//!         Err(err) => eprintln!("{}", err.detail()),
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{inputs_from_pairs, parse_input_value, to_tera_context, TemplateInputs};
pub use engine::TemplateEngine;
pub use error::RenderError;
