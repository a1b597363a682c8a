//! C-ABI wrapper around `hyperdrive-core`.
//!
//! # Overview
//! Exposes request building and response interpretation through `extern "C"`
//! functions so any language with a C FFI can walk a hypermedia API while
//! keeping HTTP execution on its own side of the boundary.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Structured inputs (transitions, parameters, attributes) arrive as JSON
//!   C strings; representors leave as JSON C strings.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `hyperdrive_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use hyperdrive_core::{Attributes, Parameters, Transition};
use serde::de::DeserializeOwned;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a `HypermediaClient` with the standard encoders and deserializers.
///
/// Returns null only if an internal panic occurs.
/// The caller must free the returned pointer with `hyperdrive_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_client_new() -> *mut FfiClient {
    catch_unwind(AssertUnwindSafe(|| {
        Box::into_raw(Box::new(FfiClient {
            inner: hyperdrive_core::HypermediaClient::new(),
        }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `hyperdrive_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Decode an optional JSON argument. Null means "absent".
fn json_arg<T: DeserializeOwned>(ptr: *const c_char, name: &str) -> Result<Option<T>, *mut FfiResult> {
    if ptr.is_null() {
        return Ok(None);
    }
    let text = unsafe { read_str(ptr) }
        .ok_or_else(|| FfiResult::invalid_argument(name, "not valid UTF-8"))?;
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| FfiResult::invalid_argument(name, &e.to_string()))
}

fn required_str<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiResult> {
    if ptr.is_null() {
        return Err(FfiResult::null_arg(name));
    }
    unsafe { read_str(ptr) }.ok_or_else(|| FfiResult::invalid_argument(name, "not valid UTF-8"))
}

fn request_result(result: hyperdrive_core::RequestResult) -> *mut FfiResult {
    match result {
        Ok(req) => FfiResult::ok_request(req),
        Err(e) => FfiResult::from_error(e),
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the discovery request for a root URI.
///
/// On success `data` is an `FfiHttpRequest*`. An unparseable `uri` yields
/// `InvalidUri`. Free the result with `hyperdrive_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_build_enter(
    client: *const FfiClient,
    uri: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let uri = match required_str(uri, "uri") {
            Ok(uri) => uri,
            Err(result) => return result,
        };
        request_result(client.inner.build_enter(uri))
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in hyperdrive_build_enter"))
}

/// Build a GET request for a URI template.
///
/// `parameters_json` is a JSON object of template variables, or null.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_build_request(
    client: *const FfiClient,
    uri: *const c_char,
    parameters_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let uri = match required_str(uri, "uri") {
            Ok(uri) => uri,
            Err(result) => return result,
        };
        let parameters = match json_arg::<Parameters>(parameters_json, "parameters") {
            Ok(p) => p,
            Err(result) => return result,
        };
        request_result(client.inner.build_request(uri, parameters.as_ref()))
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in hyperdrive_build_request"))
}

/// Build the request that follows a transition.
///
/// `transition_json` is a transition as found in a parsed representor.
/// `parameters_json` and `attributes_json` are JSON objects, or null.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_build_transition(
    client: *const FfiClient,
    transition_json: *const c_char,
    parameters_json: *const c_char,
    attributes_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if transition_json.is_null() {
            return FfiResult::null_arg("transition");
        }
        let client = unsafe { &*client };
        let transition = match json_arg::<Transition>(transition_json, "transition") {
            Ok(Some(t)) => t,
            Ok(None) => return FfiResult::null_arg("transition"),
            Err(result) => return result,
        };
        let parameters = match json_arg::<Parameters>(parameters_json, "parameters") {
            Ok(p) => p,
            Err(result) => return result,
        };
        let attributes = match json_arg::<Attributes>(attributes_json, "attributes") {
            Ok(a) => a,
            Err(result) => return result,
        };
        request_result(client.inner.build_transition(
            &transition,
            parameters.as_ref(),
            attributes.as_ref(),
        ))
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in hyperdrive_build_transition"))
}

// ---------------------------------------------------------------------------
// Parse response
// ---------------------------------------------------------------------------

/// Interpret the response the caller received for `request`.
///
/// On success `data` is a `char*` holding the representor as JSON, with
/// every transition URI made absolute against the response URL. A missing
/// or unreadable body yields the empty representor, never an error.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_parse_response(
    client: *const FfiClient,
    request: *const FfiHttpRequest,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if request.is_null() {
            return FfiResult::null_arg("request");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let request = unsafe { (*request).to_core() };
        let outcome = unsafe { (*response).to_core() };

        match client.inner.parse_response(&request, Ok(outcome)) {
            Ok(representor) => match serde_json::to_string(&representor) {
                Ok(json) => FfiResult::ok_representor(json),
                Err(e) => FfiResult::panic(&format!("representor serialization failed: {e}")),
            },
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in hyperdrive_parse_response"))
}

/// Report that the caller's transport failed to execute `request`.
///
/// The failure passes through the client unchanged: the result carries
/// `FfiErrorCode::Transport` with the given `domain`, `code` and `message`.
/// A null `message` reads as empty.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_parse_failure(
    client: *const FfiClient,
    request: *const FfiHttpRequest,
    domain: *const c_char,
    code: i64,
    message: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if request.is_null() {
            return FfiResult::null_arg("request");
        }
        let domain = match required_str(domain, "domain") {
            Ok(domain) => domain,
            Err(result) => return result,
        };
        let message = unsafe { read_str(message) }.unwrap_or_default();
        let client = unsafe { &*client };
        let request = unsafe { (*request).to_core() };

        let failure = hyperdrive_core::TransportError::new(domain, code, message);
        match client.inner.parse_response(&request, Err(failure)) {
            Ok(representor) => match serde_json::to_string(&representor) {
                Ok(json) => FfiResult::ok_representor(json),
                Err(e) => FfiResult::panic(&format!("representor serialization failed: {e}")),
            },
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in hyperdrive_parse_failure"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiResult` and whatever its `data` points to. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_free_result(result: *mut FfiResult) {
    if !result.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| FfiResult::free(result)));
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hyperdrive_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{CStr, CString};

    fn headers(req: &FfiHttpRequest) -> Vec<(String, String)> {
        if req.headers.is_null() {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) }
            .iter()
            .map(|h| unsafe {
                (
                    CStr::from_ptr(h.key).to_str().unwrap().to_string(),
                    CStr::from_ptr(h.value).to_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    fn url(req: &FfiHttpRequest) -> &str {
        unsafe { CStr::from_ptr(req.url) }.to_str().unwrap()
    }

    fn request_of(result: *mut FfiResult) -> &'static FfiHttpRequest {
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Ok));
        assert!(matches!(r.data_tag, FfiDataTag::Request));
        unsafe { &*(r.data as *const FfiHttpRequest) }
    }

    fn representor_of(result: *mut FfiResult) -> serde_json::Value {
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Ok));
        assert!(matches!(r.data_tag, FfiDataTag::Representor));
        let json = unsafe { CStr::from_ptr(r.data as *const c_char) }.to_str().unwrap();
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn client_new_and_free() {
        let client = hyperdrive_client_new();
        assert!(!client.is_null());
        hyperdrive_client_free(client);
    }

    #[test]
    fn client_free_null_is_safe() {
        hyperdrive_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_enter_returns_get_with_accept() {
        let client = hyperdrive_client_new();
        let uri = CString::new("http://localhost:3000/").unwrap();
        let result = hyperdrive_build_enter(client, uri.as_ptr());

        let req = request_of(result);
        assert!(matches!(req.method, FfiHttpMethod::Get));
        assert_eq!(url(req), "http://localhost:3000/");
        assert!(req.body.is_null());
        assert_eq!(
            headers(req),
            vec![(
                "accept".to_string(),
                hyperdrive_core::ACCEPT.to_string()
            )]
        );

        hyperdrive_free_result(result);
        hyperdrive_client_free(client);
    }

    #[test]
    fn build_enter_invalid_uri_reports_domain_and_code() {
        let client = hyperdrive_client_new();
        let uri = CString::new("not a valid ::uri").unwrap();
        let result = hyperdrive_build_enter(client, uri.as_ptr());

        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::InvalidUri));
        assert!(matches!(r.data_tag, FfiDataTag::None));
        assert!(r.data.is_null());
        assert_eq!(r.domain_code, 0);
        let domain = unsafe { CStr::from_ptr(r.error_domain) }.to_str().unwrap();
        assert_eq!(domain, hyperdrive_core::error::ERROR_DOMAIN);
        let message = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert_eq!(message, hyperdrive_core::error::INVALID_URI_MESSAGE);

        hyperdrive_free_result(result);
        hyperdrive_client_free(client);
    }

    #[test]
    fn build_enter_null_arguments() {
        let uri = CString::new("http://localhost:3000/").unwrap();
        let result = hyperdrive_build_enter(std::ptr::null(), uri.as_ptr());
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::NullArg));
        hyperdrive_free_result(result);

        let client = hyperdrive_client_new();
        let result = hyperdrive_build_enter(client, std::ptr::null());
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::NullArg));
        hyperdrive_free_result(result);
        hyperdrive_client_free(client);
    }

    #[test]
    fn build_request_expands_parameters() {
        let client = hyperdrive_client_new();
        let uri = CString::new("http://x.test/{id}{?q}").unwrap();
        let params = CString::new(r#"{"id":"5","q":"a b"}"#).unwrap();
        let result = hyperdrive_build_request(client, uri.as_ptr(), params.as_ptr());

        let req = request_of(result);
        assert_eq!(url(req), "http://x.test/5?q=a%20b");

        hyperdrive_free_result(result);
        hyperdrive_client_free(client);
    }

    #[test]
    fn build_request_rejects_malformed_parameters() {
        let client = hyperdrive_client_new();
        let uri = CString::new("http://x.test/{id}").unwrap();
        let params = CString::new("{not json").unwrap();
        let result = hyperdrive_build_request(client, uri.as_ptr(), params.as_ptr());

        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::InvalidArgument));
        assert!(r.data.is_null());

        hyperdrive_free_result(result);
        hyperdrive_client_free(client);
    }

    #[test]
    fn build_transition_encodes_attributes() {
        let client = hyperdrive_client_new();
        let transition = CString::new(
            r#"{"uri":"http://x.test/todos","method":"POST",
                "suggestedContentTypes":["application/x-www-form-urlencoded"]}"#,
        )
        .unwrap();
        let attributes = CString::new(r#"{"title":"milk","done":false}"#).unwrap();
        let result = hyperdrive_build_transition(
            client,
            transition.as_ptr(),
            std::ptr::null(),
            attributes.as_ptr(),
        );

        let req = request_of(result);
        assert!(matches!(req.method, FfiHttpMethod::Post));
        assert_eq!(url(req), "http://x.test/todos");
        assert!(headers(req).contains(&(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string()
        )));
        let body = unsafe { std::slice::from_raw_parts(req.body, req.body_len) };
        assert_eq!(body, b"done=false&title=milk");

        hyperdrive_free_result(result);
        hyperdrive_client_free(client);
    }

    #[test]
    fn build_transition_null_transition_is_null_arg() {
        let client = hyperdrive_client_new();
        let result = hyperdrive_build_transition(
            client,
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
        );
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::NullArg));

        hyperdrive_free_result(result);
        hyperdrive_client_free(client);
    }

    #[test]
    fn parse_response_rewrites_relative_links() {
        let client = hyperdrive_client_new();
        let uri = CString::new("http://example.com/api/").unwrap();
        let built = hyperdrive_build_enter(client, uri.as_ptr());
        let req = request_of(built);

        let body = br#"{"transitions":{"next":{"uri":"page2"}},"attributes":{"n":1}}"#;
        let response_url = CString::new("http://example.com/api/").unwrap();
        let content_type = CString::new("application/vnd.representor+json").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            url: response_url.as_ptr(),
            content_type: content_type.as_ptr(),
            body: body.as_ptr(),
            body_len: body.len(),
        };
        let result = hyperdrive_parse_response(client, req, &resp);

        let doc = representor_of(result);
        assert_eq!(doc["transitions"]["next"]["uri"], "http://example.com/api/page2");
        assert_eq!(doc["attributes"]["n"], 1);

        hyperdrive_free_result(result);
        hyperdrive_free_result(built);
        hyperdrive_client_free(client);
    }

    #[test]
    fn parse_response_without_body_is_empty() {
        let client = hyperdrive_client_new();
        let uri = CString::new("http://example.com/").unwrap();
        let built = hyperdrive_build_enter(client, uri.as_ptr());
        let req = request_of(built);

        let resp = FfiHttpResponse {
            status: 204,
            url: std::ptr::null(),
            content_type: std::ptr::null(),
            body: std::ptr::null(),
            body_len: 0,
        };
        let result = hyperdrive_parse_response(client, req, &resp);

        let doc = representor_of(result);
        assert!(doc["transitions"].as_object().unwrap().is_empty());
        assert!(doc["attributes"].as_object().unwrap().is_empty());

        hyperdrive_free_result(result);
        hyperdrive_free_result(built);
        hyperdrive_client_free(client);
    }

    #[test]
    fn parse_response_null_arguments() {
        let client = hyperdrive_client_new();
        let resp = FfiHttpResponse {
            status: 200,
            url: std::ptr::null(),
            content_type: std::ptr::null(),
            body: std::ptr::null(),
            body_len: 0,
        };
        let result = hyperdrive_parse_response(client, std::ptr::null(), &resp);
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::NullArg));
        hyperdrive_free_result(result);

        let result = hyperdrive_parse_response(std::ptr::null(), std::ptr::null(), &resp);
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::NullArg));
        hyperdrive_free_result(result);

        hyperdrive_client_free(client);
    }

    #[test]
    fn parse_failure_passes_transport_error_through() {
        let client = hyperdrive_client_new();
        let uri = CString::new("http://example.com/").unwrap();
        let built = hyperdrive_build_enter(client, uri.as_ptr());
        let req = request_of(built);

        let domain = CString::new("NSURLErrorDomain").unwrap();
        let message = CString::new("The request timed out.").unwrap();
        let result =
            hyperdrive_parse_failure(client, req, domain.as_ptr(), -1001, message.as_ptr());

        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Transport));
        assert!(matches!(r.data_tag, FfiDataTag::None));
        assert!(r.data.is_null());
        assert_eq!(r.domain_code, -1001);
        let got_domain = unsafe { CStr::from_ptr(r.error_domain) }.to_str().unwrap();
        assert_eq!(got_domain, "NSURLErrorDomain");
        let got_message = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert_eq!(got_message, "The request timed out.");

        hyperdrive_free_result(result);
        hyperdrive_free_result(built);
        hyperdrive_client_free(client);
    }

    #[test]
    fn parse_failure_null_domain_is_null_arg() {
        let client = hyperdrive_client_new();
        let uri = CString::new("http://example.com/").unwrap();
        let built = hyperdrive_build_enter(client, uri.as_ptr());
        let req = request_of(built);

        let result =
            hyperdrive_parse_failure(client, req, std::ptr::null(), 0, std::ptr::null());
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::NullArg));

        hyperdrive_free_result(result);
        hyperdrive_free_result(built);
        hyperdrive_client_free(client);
    }

    #[test]
    fn free_result_null_is_safe() {
        hyperdrive_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        hyperdrive_free_string(std::ptr::null_mut());
    }
}
