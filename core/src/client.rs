//! Stateless hypermedia client.
//!
//! # Design
//! `HypermediaClient` holds only immutable collaborators: the encoder table,
//! the body deserializer and the URI template expander. It carries no state
//! between calls and is safe to share across threads.
//!
//! Every round-trip is split in two, as in the host-does-IO pattern: a
//! `build_*` method produces an `HttpRequest`, the host executes it, and
//! `parse_response` turns what came back into a rewritten `Representor`.
//! `enter`, `request` and `follow` chain both halves through a `Transport`
//! for hosts that can execute requests synchronously.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::encoder::EncoderRegistry;
use crate::error::ClientError;
use crate::http::{HttpRequest, ResponseResult};
use crate::interpret::{interpret, BodyDeserializer, DeserializerRegistry};
use crate::request::{RequestBuilder, RequestResult};
use crate::template::{Rfc6570, TemplateExpander};
use crate::types::{Attributes, Parameters, Representor, Transition};

/// Executes an `HttpRequest` and reports exactly one outcome.
///
/// Timeouts, cancellation and connection reuse are the transport's business.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> ResponseResult;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> ResponseResult,
{
    fn execute(&self, request: &HttpRequest) -> ResponseResult {
        self(request)
    }
}

#[derive(Clone)]
pub struct HypermediaClient {
    encoders: EncoderRegistry,
    deserializer: Arc<dyn BodyDeserializer>,
    expander: Arc<dyn TemplateExpander>,
}

impl HypermediaClient {
    /// A client with JSON and form encoders, the representor JSON
    /// deserializer and RFC 6570 expansion.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HypermediaClientBuilder {
        HypermediaClientBuilder::default()
    }

    fn requests(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(self.expander.as_ref(), &self.encoders)
    }

    /// Build the discovery request for a root URI.
    pub fn build_enter(&self, uri: &str) -> RequestResult {
        self.requests().build_from_uri(uri, None)
    }

    pub fn build_request(&self, uri: &str, parameters: Option<&Parameters>) -> RequestResult {
        self.requests().build_from_uri(uri, parameters)
    }

    pub fn build_transition(
        &self,
        transition: &Transition,
        parameters: Option<&Parameters>,
        attributes: Option<&Attributes>,
    ) -> RequestResult {
        self.requests()
            .build_from_transition(transition, parameters, attributes)
    }

    /// Turn what the transport reported for `request` into a representor.
    ///
    /// Transport failures are returned unchanged. A response whose body is
    /// missing or unreadable yields the empty representor.
    pub fn parse_response(
        &self,
        request: &HttpRequest,
        outcome: ResponseResult,
    ) -> Result<Representor, ClientError> {
        let (response, body) = outcome?;
        debug!(status = response.status, url = %response.url, "interpreting response");
        Ok(interpret(
            self.deserializer.as_ref(),
            request,
            &response,
            body.as_deref(),
        ))
    }

    /// Fetch the document at `uri`.
    #[instrument(name = "hypermedia_enter", skip(self, transport))]
    pub fn enter(&self, transport: &impl Transport, uri: &str) -> Result<Representor, ClientError> {
        self.round_trip(transport, self.build_enter(uri))
    }

    #[instrument(name = "hypermedia_request", skip(self, transport, parameters))]
    pub fn request(
        &self,
        transport: &impl Transport,
        uri: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Representor, ClientError> {
        self.round_trip(transport, self.build_request(uri, parameters))
    }

    #[instrument(
        name = "hypermedia_follow",
        skip_all,
        fields(uri = %transition.uri, method = %transition.method)
    )]
    pub fn follow(
        &self,
        transport: &impl Transport,
        transition: &Transition,
        parameters: Option<&Parameters>,
        attributes: Option<&Attributes>,
    ) -> Result<Representor, ClientError> {
        self.round_trip(
            transport,
            self.build_transition(transition, parameters, attributes),
        )
    }

    fn round_trip(
        &self,
        transport: &impl Transport,
        request: RequestResult,
    ) -> Result<Representor, ClientError> {
        let request = request?;
        debug!(method = %request.method, url = %request.url, "executing request");
        let outcome = transport.execute(&request);
        if let Err(e) = &outcome {
            warn!(domain = %e.domain, code = e.code, error = %e, "transport failed");
        }
        self.parse_response(&request, outcome)
    }
}

impl Default for HypermediaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HypermediaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HypermediaClient")
            .field("encoders", &self.encoders)
            .finish_non_exhaustive()
    }
}

/// Configures a `HypermediaClient`. Unset collaborators keep their defaults.
pub struct HypermediaClientBuilder {
    encoders: EncoderRegistry,
    deserializer: Arc<dyn BodyDeserializer>,
    expander: Arc<dyn TemplateExpander>,
}

impl Default for HypermediaClientBuilder {
    fn default() -> Self {
        Self {
            encoders: EncoderRegistry::default(),
            deserializer: Arc::new(DeserializerRegistry::standard()),
            expander: Arc::new(Rfc6570),
        }
    }
}

impl HypermediaClientBuilder {
    pub fn encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = encoders;
        self
    }

    /// Replaces the body deserializer, typically with a
    /// `DeserializerRegistry` that knows HAL or Siren.
    pub fn deserializer(mut self, deserializer: impl BodyDeserializer + 'static) -> Self {
        self.deserializer = Arc::new(deserializer);
        self
    }

    pub fn expander(mut self, expander: impl TemplateExpander + 'static) -> Self {
        self.expander = Arc::new(expander);
        self
    }

    pub fn build(self) -> HypermediaClient {
        HypermediaClient {
            encoders: self.encoders,
            deserializer: self.deserializer,
            expander: self.expander,
        }
    }
}
