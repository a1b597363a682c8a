//! Resolution of possibly-relative link targets against a document's URL.
//!
//! Resolution never fails: anything that cannot be resolved is returned
//! unchanged, so one malformed link does not abort traversal of an otherwise
//! valid document.

use url::Url;

/// Resolve `uri` against `base`, returning the absolute form.
///
/// Without a base, or when `uri` cannot be joined onto it, `uri` comes back
/// untouched. Template expressions survive resolution: only the literal text
/// before the first `{` is resolved, the rest is appended verbatim, so
/// `"/todos/{id}"` against `http://h/` becomes `http://h/todos/{id}` instead
/// of a percent-encoded brace.
///
/// A URI that starts with an expression has no literal part to resolve and
/// is returned unchanged, as is one whose first expression would not
/// continue the resolved URL (`{?q}` after an existing query, `{/x}` after a
/// trailing slash).
pub fn resolve(base: Option<&Url>, uri: &str) -> String {
    let Some(base) = base else {
        return uri.to_string();
    };

    let (literal, template) = match uri.find('{') {
        Some(0) => return uri.to_string(),
        Some(at) => uri.split_at(at),
        None => (uri, ""),
    };

    match base.join(literal) {
        Ok(resolved) if continues(&resolved, template) => {
            let mut absolute = String::from(resolved);
            absolute.push_str(template);
            absolute
        }
        _ => uri.to_string(),
    }
}

/// Whether `template` can be appended to `resolved` as-is.
fn continues(resolved: &Url, template: &str) -> bool {
    let open_query = resolved.query().is_none() && resolved.fragment().is_none();
    match template.as_bytes().get(1) {
        Some(b'?') => open_query,
        Some(b'&') | Some(b'#') => resolved.fragment().is_none(),
        Some(b'/') => open_query && !resolved.path().ends_with('/'),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn identity_without_base() {
        assert_eq!(resolve(None, "http://a/b"), "http://a/b");
        assert_eq!(resolve(None, "/relative"), "/relative");
    }

    #[test]
    fn relative_path_joins_directory() {
        let b = base("http://example.com/a/");
        assert_eq!(resolve(Some(&b), "b"), "http://example.com/a/b");
    }

    #[test]
    fn absolute_path_replaces_path() {
        let b = base("http://example.com/a/b?x=1");
        assert_eq!(resolve(Some(&b), "/c"), "http://example.com/c");
    }

    #[test]
    fn absolute_uri_is_kept() {
        let b = base("http://example.com/a/");
        assert_eq!(resolve(Some(&b), "https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn resolving_twice_is_stable() {
        let b = base("http://example.com/a/");
        let once = resolve(Some(&b), "../up/{id}");
        assert_eq!(once, "http://example.com/up/{id}");
        assert_eq!(resolve(Some(&b), &once), once);
    }

    #[test]
    fn template_expressions_are_preserved() {
        let b = base("http://example.com/api/");
        assert_eq!(
            resolve(Some(&b), "/todos/{id}"),
            "http://example.com/todos/{id}"
        );
        assert_eq!(
            resolve(Some(&b), "search{?q,page}"),
            "http://example.com/api/search{?q,page}"
        );
    }

    #[test]
    fn leading_expression_is_returned_unchanged() {
        let b = base("http://api.test/list?page=1");
        assert_eq!(resolve(Some(&b), "{?page}"), "{?page}");
        assert_eq!(resolve(Some(&b), "{+next}"), "{+next}");
        let b = base("http://api.test/root/");
        assert_eq!(resolve(Some(&b), "{/seg}"), "{/seg}");
    }

    #[test]
    fn operator_must_continue_the_resolved_url() {
        let b = base("http://example.com/a/");
        assert_eq!(
            resolve(Some(&b), "search?x=1{&page}"),
            "http://example.com/a/search?x=1{&page}"
        );
        assert_eq!(resolve(Some(&b), "search?x=1{?page}"), "search?x=1{?page}");
        assert_eq!(resolve(Some(&b), "items{/id}"), "http://example.com/a/items{/id}");
        assert_eq!(resolve(Some(&b), "items/{/id}"), "items/{/id}");
        assert_eq!(resolve(Some(&b), "page#top{#more}"), "page#top{#more}");
    }

    #[test]
    fn unresolvable_input_is_returned_unchanged() {
        let b = base("http://example.com/");
        assert_eq!(resolve(Some(&b), "http://[::1"), "http://[::1");
    }
}
