//! Turns a response body into a rewritten representor tree.
//!
//! # Design
//! Reading a document never fails. A missing body, a content type nobody
//! understands or a body that does not parse all produce the empty
//! representor, since a response may legitimately carry no hypermedia.
//! Body grammars (HAL, Siren, ...) plug in through `BodyDeserializer`.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::http::{media_type, HttpRequest, HttpResponse};
use crate::rewrite::rewrite;
use crate::types::Representor;

/// Content type of bodies written in this crate's own serde shape.
pub const REPRESENTOR_JSON: &str = "application/vnd.representor+json";

/// Parses a response body into a representor tree.
///
/// Returns `None` when the body is not a format this deserializer handles.
pub trait BodyDeserializer: Send + Sync {
    fn deserialize(&self, response: &HttpResponse, body: &[u8]) -> Option<Representor>;
}

impl<F> BodyDeserializer for F
where
    F: Fn(&HttpResponse, &[u8]) -> Option<Representor> + Send + Sync,
{
    fn deserialize(&self, response: &HttpResponse, body: &[u8]) -> Option<Representor> {
        self(response, body)
    }
}

/// Reads bodies that are a serialized `Representor`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepresentorJson;

impl BodyDeserializer for RepresentorJson {
    fn deserialize(&self, _response: &HttpResponse, body: &[u8]) -> Option<Representor> {
        serde_json::from_slice(body)
            .inspect_err(|e| debug!(error = %e, "body is not a valid representor document"))
            .ok()
    }
}

/// Picks a deserializer by the response's content type.
#[derive(Clone, Default)]
pub struct DeserializerRegistry {
    deserializers: Vec<(String, Arc<dyn BodyDeserializer>)>,
}

impl DeserializerRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers `deserializer` for `content_type`, replacing any previous one.
    pub fn with_deserializer(
        mut self,
        content_type: &str,
        deserializer: impl BodyDeserializer + 'static,
    ) -> Self {
        let content_type = media_type(content_type);
        self.deserializers
            .retain(|(registered, _)| *registered != content_type);
        self.deserializers
            .push((content_type, Arc::new(deserializer)));
        self
    }

    /// The registry used by a default client: knows `REPRESENTOR_JSON`.
    pub fn standard() -> Self {
        Self::empty().with_deserializer(REPRESENTOR_JSON, RepresentorJson)
    }
}

impl BodyDeserializer for DeserializerRegistry {
    fn deserialize(&self, response: &HttpResponse, body: &[u8]) -> Option<Representor> {
        let Some(content_type) = response.content_type() else {
            debug!("response has no content type");
            return None;
        };
        let Some((_, deserializer)) = self
            .deserializers
            .iter()
            .find(|(registered, _)| *registered == content_type)
        else {
            debug!(content_type = %content_type, "no deserializer for content type");
            return None;
        };
        deserializer.deserialize(response, body)
    }
}

impl fmt::Debug for DeserializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content_types: Vec<&str> = self
            .deserializers
            .iter()
            .map(|(ct, _)| ct.as_str())
            .collect();
        f.debug_struct("DeserializerRegistry")
            .field("content_types", &content_types)
            .finish()
    }
}

/// Interpret a response body as a hypermedia document.
///
/// Every transition URI in the result is absolute, resolved against the
/// response URL, or the request URL when the response does not carry a
/// usable one.
pub fn interpret(
    deserializer: &dyn BodyDeserializer,
    request: &HttpRequest,
    response: &HttpResponse,
    body: Option<&[u8]>,
) -> Representor {
    let Some(body) = body else {
        return Representor::empty();
    };
    let Some(representor) = deserializer.deserialize(response, body) else {
        return Representor::empty();
    };

    let base = Url::parse(&response.url)
        .or_else(|_| Url::parse(&request.url))
        .ok();
    rewrite(base.as_ref(), &representor)
}
