//! Turns URIs and transitions into outbound `HttpRequest` values.
//!
//! # Design
//! Building is a short-circuiting chain over `Result`: expand the template,
//! parse the URI, then apply the transition's method and body. A failure at
//! any step is returned as-is and no later step runs, so callers never see a
//! partially built request.

use tracing::warn;
use url::Url;

use crate::encoder::EncoderRegistry;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest};
use crate::template::TemplateExpander;
use crate::types::{Attributes, Parameters, Transition};

/// `Accept` header value sent with every request.
///
/// Header names on built requests are always lower case (`accept`,
/// `content-type`), so hosts can compare them byte for byte.
pub const ACCEPT: &str = "application/vnd.siren+json; application/hal+json";

/// Result of building a request.
pub type RequestResult = Result<HttpRequest, ClientError>;

/// Borrowed view of the collaborators needed to build requests.
#[derive(Clone, Copy)]
pub struct RequestBuilder<'a> {
    expander: &'a dyn TemplateExpander,
    encoders: &'a EncoderRegistry,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(expander: &'a dyn TemplateExpander, encoders: &'a EncoderRegistry) -> Self {
        Self { expander, encoders }
    }

    /// Expand `template` and build a GET request for it.
    ///
    /// Absent parameters expand as an empty set. Fails with
    /// `ClientError::InvalidUri` when the expansion is not an absolute URI.
    pub fn build_from_uri(&self, template: &str, parameters: Option<&Parameters>) -> RequestResult {
        let empty = Parameters::new();
        let expanded = self
            .expander
            .expand(template, parameters.unwrap_or(&empty));

        let url = Url::parse(&expanded).map_err(|e| {
            warn!(uri = %expanded, error = %e, "expanded URI template is not a valid URI");
            ClientError::InvalidUri { uri: expanded.clone() }
        })?;

        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![("accept".to_string(), ACCEPT.to_string())],
            body: None,
        })
    }

    /// Build the request that follows `transition`.
    ///
    /// The transition's method is applied, and when `attributes` are given
    /// they become the body, encoded with the first of the transition's
    /// suggested content types that has an encoder. An encoder that yields
    /// nothing leaves the request without a body.
    pub fn build_from_transition(
        &self,
        transition: &Transition,
        parameters: Option<&Parameters>,
        attributes: Option<&Attributes>,
    ) -> RequestResult {
        self.build_from_uri(&transition.uri, parameters)
            .map(|mut request| {
                request.method = transition.method;
                if let Some(body) = attributes.and_then(|attributes| {
                    self.encoders
                        .encode(attributes, &transition.suggested_content_types)
                }) {
                    request
                        .headers
                        .push(("content-type".to_string(), body.content_type));
                    request.body = Some(body.bytes);
                }
                request
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::encoder::{FORM, JSON};
    use crate::error::{ERROR_DOMAIN, INVALID_URI_MESSAGE};
    use crate::template::Rfc6570;

    fn params(value: serde_json::Value) -> Parameters {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn build_from_uri_expands_template() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let req = builder
            .build_from_uri("http://x.test/{id}", Some(&params(json!({"id": "5"}))))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://x.test/5");
        assert_eq!(
            req.header("Accept"),
            Some("application/vnd.siren+json; application/hal+json")
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn header_names_are_lower_case() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let transition = Transition::builder("http://x.test/todos")
            .method(HttpMethod::Post)
            .build();
        let attributes: Attributes = params(json!({"title": "milk"}));
        let req = builder
            .build_from_transition(&transition, None, Some(&attributes))
            .unwrap();
        let names: Vec<&str> = req.headers.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["accept", "content-type"]);
    }

    #[test]
    fn absent_parameters_expand_as_empty() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let req = builder.build_from_uri("http://x.test/todos{?page}", None).unwrap();
        assert_eq!(req.url, "http://x.test/todos");
    }

    #[test]
    fn invalid_uri_is_a_failure() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let err = builder.build_from_uri("not a valid ::uri", None).unwrap_err();
        assert_eq!(err.code(), 0);
        assert_eq!(err.domain(), ERROR_DOMAIN);
        assert_eq!(err.to_string(), INVALID_URI_MESSAGE);
        assert!(matches!(err, ClientError::InvalidUri { ref uri } if uri == "not a valid ::uri"));
    }

    #[test]
    fn relative_uri_is_a_failure() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        assert!(builder.build_from_uri("/todos", None).is_err());
    }

    #[test]
    fn transition_sets_method_body_and_content_type() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let transition = Transition::builder("http://x.test/todos")
            .method(HttpMethod::Post)
            .suggest_content_type(FORM)
            .build();
        let attributes = params(json!({"title": "Buy milk"}));

        let req = builder
            .build_from_transition(&transition, None, Some(&attributes))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some(FORM));
        assert_eq!(req.body.as_deref(), Some(&b"title=Buy+milk"[..]));
        assert!(req.header("accept").is_some());
    }

    #[test]
    fn transition_without_attributes_has_no_body() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let transition = Transition::builder("http://x.test/todos/{id}")
            .method(HttpMethod::Delete)
            .build();
        let req = builder
            .build_from_transition(&transition, Some(&params(json!({"id": 7}))), None)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://x.test/todos/7");
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn transition_falls_back_to_json() {
        let encoders = EncoderRegistry::default();
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let transition = Transition::builder("http://x.test/todos")
            .method(HttpMethod::Put)
            .suggest_content_type("application/vnd.unknown")
            .build();
        let attributes = params(json!({"done": true}));
        let req = builder
            .build_from_transition(&transition, None, Some(&attributes))
            .unwrap();
        assert_eq!(req.header("content-type"), Some(JSON));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"done": true}));
    }

    #[test]
    fn failure_never_reaches_the_encoder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let encoders = EncoderRegistry::empty(JSON).with_encoder(JSON, move |_: &Attributes| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(Vec::new())
        });
        let builder = RequestBuilder::new(&Rfc6570, &encoders);
        let transition = Transition::builder("not a valid ::uri")
            .method(HttpMethod::Post)
            .build();

        let result =
            builder.build_from_transition(&transition, None, Some(&params(json!({"a": 1}))));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let transition = transition.with_uri("http://x.test/".to_string());
        builder
            .build_from_transition(&transition, None, Some(&params(json!({"a": 1}))))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
