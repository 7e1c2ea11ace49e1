//! Template inputs: caller-supplied named variables for a render.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::RenderError;

/// Named variable bindings handed to the engine.
pub type TemplateInputs = HashMap<String, Value>;

/// Build a Tera context from `inputs`.
pub fn to_tera_context(inputs: &TemplateInputs) -> Result<tera::Context, RenderError> {
    Ok(tera::Context::from_serialize(inputs)?)
}

/// Interpret a raw command-line value.
///
/// Anything that parses as JSON (objects, arrays, numbers, booleans) keeps its
/// structure; everything else is taken as a plain string.
pub fn parse_input_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Collect string pairs into [`TemplateInputs`].
pub fn inputs_from_pairs<I, K, V>(pairs: I) -> TemplateInputs
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
