//! The hypermedia document model.
//!
//! # Design
//! A `Representor` is one resource state: its attributes, the transitions a
//! client may follow from it, and any embedded representors grouped by
//! relation. Trees are built fresh for every response and treated as
//! immutable afterwards; rewriting produces a new tree rather than editing
//! one in place.
//!
//! All types derive serde with camelCase keys and defaulted fields. That
//! shape is what `application/vnd.representor+json` bodies use and what the
//! C ABI hands back to hosts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::http::HttpMethod;

/// Dynamically typed attribute or parameter value.
pub type Value = serde_json::Value;

/// Request-body attributes supplied when following a transition.
pub type Attributes = HashMap<String, Value>;

/// URI template variables supplied when building a request.
pub type Parameters = HashMap<String, Value>;

/// One hypermedia resource state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Representor {
    pub transitions: HashMap<String, Transition>,
    pub representors: HashMap<String, Vec<Representor>>,
    pub attributes: HashMap<String, Value>,
    pub metadata: HashMap<String, String>,
}

impl Representor {
    /// The terminal node: no transitions and no embedded representors.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RepresentorBuilder {
        RepresentorBuilder::default()
    }

    /// True when there is nothing to follow and nothing embedded.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.representors.is_empty()
    }

    pub fn transition(&self, name: &str) -> Option<&Transition> {
        self.transitions.get(name)
    }

    /// Embedded representors for `relation`, empty when there are none.
    pub fn embedded(&self, relation: &str) -> &[Representor] {
        self.representors
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Incrementally assembles a `Representor`, mostly for deserializers.
#[derive(Debug, Default)]
pub struct RepresentorBuilder {
    representor: Representor,
}

impl RepresentorBuilder {
    /// Adds or replaces the transition called `name`.
    pub fn transition(mut self, name: impl Into<String>, transition: Transition) -> Self {
        self.representor.transitions.insert(name.into(), transition);
        self
    }

    /// Appends an embedded representor under `relation`, after any already added.
    pub fn representor(mut self, relation: impl Into<String>, representor: Representor) -> Self {
        self.representor
            .representors
            .entry(relation.into())
            .or_default()
            .push(representor);
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.representor.attributes.insert(name.into(), value.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.representor.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Representor {
        self.representor
    }
}

/// A possible state change advertised by a `Representor`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transition {
    /// URI template; may be relative and may contain RFC 6570 expressions.
    pub uri: String,
    pub method: HttpMethod,
    /// Most preferred first.
    pub suggested_content_types: Vec<String>,
    pub attributes: HashMap<String, AttributeDescriptor>,
    pub parameters: HashMap<String, AttributeDescriptor>,
}

impl Transition {
    pub fn builder(uri: impl Into<String>) -> TransitionBuilder {
        TransitionBuilder {
            transition: Transition {
                uri: uri.into(),
                ..Transition::default()
            },
        }
    }

    /// Copy of this transition pointing at `uri`; every other field is kept.
    pub fn with_uri(&self, uri: String) -> Self {
        Self {
            uri,
            ..self.clone()
        }
    }
}

#[derive(Debug)]
pub struct TransitionBuilder {
    transition: Transition,
}

impl TransitionBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.transition.method = method;
        self
    }

    /// Appends a content type with lower preference than those already added.
    pub fn suggest_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.transition
            .suggested_content_types
            .push(content_type.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, descriptor: AttributeDescriptor) -> Self {
        self.transition.attributes.insert(name.into(), descriptor);
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, descriptor: AttributeDescriptor) -> Self {
        self.transition.parameters.insert(name.into(), descriptor);
        self
    }

    pub fn build(self) -> Transition {
        self.transition
    }
}

/// Describes an expected request-body field or template variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttributeDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl AttributeDescriptor {
    pub fn new(value: Option<Value>, default_value: Option<Value>) -> Self {
        Self {
            value,
            default_value,
        }
    }
}
