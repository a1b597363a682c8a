//! Absolute-URI rewriting of representor trees.

use url::Url;

use crate::types::Representor;
use crate::uri::resolve;

/// Build a copy of `node` in which every transition URI, at every depth, is
/// resolved against `base`.
///
/// Embedded representors are resolved against the same `base` as the root:
/// links inside a document are relative to where the document was fetched
/// from, not to any embedded resource. Attributes and metadata are copied
/// as they are. The input tree is left untouched.
pub fn rewrite(base: Option<&Url>, node: &Representor) -> Representor {
    let transitions = node
        .transitions
        .iter()
        .map(|(name, transition)| {
            let uri = resolve(base, &transition.uri);
            (name.clone(), transition.with_uri(uri))
        })
        .collect();

    let representors = node
        .representors
        .iter()
        .map(|(relation, embedded)| {
            let embedded = embedded.iter().map(|child| rewrite(base, child)).collect();
            (relation.clone(), embedded)
        })
        .collect();

    Representor {
        transitions,
        representors,
        attributes: node.attributes.clone(),
        metadata: node.metadata.clone(),
    }
}

impl Representor {
    /// See [`rewrite`].
    pub fn absolutize(&self, base: Option<&Url>) -> Representor {
        rewrite(base, self)
    }
}
