//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and interprets `HttpResponse` values without
//! ever touching the network; the host executes the actual I/O and reports
//! back a `ResponseResult`.
//!
//! Bodies are raw bytes because the encoding of a request body depends on the
//! content type picked for the transition, and response bodies are handed to
//! a format-detecting deserializer untouched.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::TransportError;

/// HTTP method for a request or a transition.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

/// An HTTP request described as plain data.
///
/// Built by `RequestBuilder`. The host executes it and returns the
/// corresponding `ResponseResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data, without its body.
///
/// `url` is the effective URL the response was served from (after any
/// redirects the host followed). Relative links in the body are resolved
/// against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The media type of the response, lower-cased and without parameters.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(media_type)
    }
}

/// What the host reports back after executing an `HttpRequest`: the response
/// and its body (absent when the server sent none), or an opaque transport
/// failure.
pub type ResponseResult = Result<(HttpResponse, Option<Vec<u8>>), TransportError>;

/// Strip parameters from a content type and normalize its case, so
/// `"Application/JSON; charset=utf-8"` compares equal to `"application/json"`.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
