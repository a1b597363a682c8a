//! Request-body encoders for transition attributes.
//!
//! # Design
//! A transition lists the content types its target accepts, most preferred
//! first. `EncoderRegistry` is an immutable table from content type to
//! encoder, built once and shared by reference; encoding picks the first
//! suggested content type the table knows and otherwise falls back to the
//! registry's default (JSON).
//!
//! Encoders fail soft. An encoder that cannot serialize its input returns
//! `None` and the request is sent without a body.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::form_urlencoded;

use crate::http::media_type;
use crate::types::{Attributes, Value};

pub const JSON: &str = "application/json";
pub const FORM: &str = "application/x-www-form-urlencoded";

/// Serializes request attributes into a body.
pub trait AttributeEncoder: Send + Sync {
    fn encode(&self, attributes: &Attributes) -> Option<Vec<u8>>;
}

impl<F> AttributeEncoder for F
where
    F: Fn(&Attributes) -> Option<Vec<u8>> + Send + Sync,
{
    fn encode(&self, attributes: &Attributes) -> Option<Vec<u8>> {
        self(attributes)
    }
}

/// Encodes attributes as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl AttributeEncoder for JsonEncoder {
    fn encode(&self, attributes: &Attributes) -> Option<Vec<u8>> {
        serde_json::to_vec(attributes)
            .inspect_err(|e| debug!(error = %e, "attributes are not serializable as JSON"))
            .ok()
    }
}

/// Encodes attributes as `application/x-www-form-urlencoded`.
///
/// Arrays repeat their key once per element and nulls are left out. Nested
/// objects have no form representation, so their presence yields no body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormEncoder;

impl AttributeEncoder for FormEncoder {
    fn encode(&self, attributes: &Attributes) -> Option<Vec<u8>> {
        let mut keys: Vec<&String> = attributes.keys().collect();
        keys.sort();

        let mut form = form_urlencoded::Serializer::new(String::new());
        for key in keys {
            match &attributes[key] {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        form.append_pair(key, &form_scalar(item)?);
                    }
                }
                value => {
                    form.append_pair(key, &form_scalar(value)?);
                }
            }
        }
        Some(form.finish().into_bytes())
    }
}

fn form_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => {
            debug!("nested attribute values have no form encoding");
            None
        }
    }
}

/// An encoded request body and the content type it was encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Immutable content-type to encoder table.
#[derive(Clone)]
pub struct EncoderRegistry {
    encoders: Vec<(String, Arc<dyn AttributeEncoder>)>,
    default_content_type: String,
}

impl EncoderRegistry {
    /// A registry with no encoders. `default_content_type` is used when none
    /// of a transition's suggestions is registered.
    pub fn empty(default_content_type: &str) -> Self {
        Self {
            encoders: Vec::new(),
            default_content_type: media_type(default_content_type),
        }
    }

    /// Registers `encoder` for `content_type`, replacing any previous one.
    pub fn with_encoder(
        mut self,
        content_type: &str,
        encoder: impl AttributeEncoder + 'static,
    ) -> Self {
        let content_type = media_type(content_type);
        self.encoders.retain(|(registered, _)| *registered != content_type);
        self.encoders.push((content_type, Arc::new(encoder)));
        self
    }

    fn lookup(&self, content_type: &str) -> Option<(&str, &dyn AttributeEncoder)> {
        let wanted = media_type(content_type);
        self.encoders
            .iter()
            .find(|(registered, _)| *registered == wanted)
            .map(|(registered, encoder)| (registered.as_str(), encoder.as_ref()))
    }

    /// Encode `attributes` with the first suggested content type that has a
    /// registered encoder, falling back to the default content type.
    ///
    /// A matched encoder that produces nothing means no body; it does not
    /// fall through to the default.
    pub fn encode(&self, attributes: &Attributes, suggested: &[String]) -> Option<EncodedBody> {
        let (content_type, encoder) = suggested
            .iter()
            .find_map(|content_type| self.lookup(content_type))
            .or_else(|| self.lookup(&self.default_content_type))?;

        let bytes = encoder.encode(attributes);
        if bytes.is_none() {
            debug!(content_type, "encoder produced no body");
        }
        bytes.map(|bytes| EncodedBody {
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::empty(JSON)
            .with_encoder(JSON, JsonEncoder)
            .with_encoder(FORM, FormEncoder)
    }
}

impl fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content_types: Vec<&str> = self.encoders.iter().map(|(ct, _)| ct.as_str()).collect();
        f.debug_struct("EncoderRegistry")
            .field("content_types", &content_types)
            .field("default_content_type", &self.default_content_type)
            .finish()
    }
}
