//! Synchronous hypermedia API client core.
//!
//! # Overview
//! Builds `HttpRequest` values from URIs and transitions, and turns responses
//! into `Representor` trees whose links are all absolute, without touching
//! the network (host-does-IO pattern). The host executes the HTTP round-trip
//! and plugs in the body formats it understands.
//!
//! # Design
//! - `HypermediaClient` is stateless; it holds immutable collaborators only.
//! - Requests are built through a short-circuiting `Result` chain: template
//!   expansion, URI parsing, method, then body encoding.
//! - Reading never fails: unknown or broken bodies become the empty
//!   representor, and every surviving link is resolved against the URL the
//!   document was fetched from.
//! - Types use owned `String` / `Vec` fields to keep the C ABI simple.

pub mod client;
pub mod encoder;
pub mod error;
pub mod http;
pub mod interpret;
pub mod request;
pub mod rewrite;
pub mod template;
pub mod types;
pub mod uri;

pub use client::{HypermediaClient, HypermediaClientBuilder, Transport};
pub use encoder::{AttributeEncoder, EncodedBody, EncoderRegistry, FormEncoder, JsonEncoder};
pub use error::{ClientError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseResult};
pub use interpret::{interpret, BodyDeserializer, DeserializerRegistry, RepresentorJson};
pub use request::{RequestBuilder, RequestResult, ACCEPT};
pub use rewrite::rewrite;
pub use template::{Rfc6570, TemplateExpander};
pub use types::{
    AttributeDescriptor, Attributes, Parameters, Representor, RepresentorBuilder, Transition,
    TransitionBuilder, Value,
};
pub use uri::resolve;
