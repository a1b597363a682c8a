//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length for byte bodies,
//! and tagged enums with explicit discriminants. Representor trees cross the
//! boundary as JSON strings rather than as nested C structs. Conversion
//! functions live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use hyperdrive_core::{ClientError, HttpMethod, HttpRequest, HttpResponse};

/// Opaque handle to a `HypermediaClient`. C callers receive a pointer to
/// this and pass it back into every FFI function.
pub struct FfiClient {
    pub(crate) inner: hyperdrive_core::HypermediaClient,
}

/// Allocate a C string, dropping interior NULs rather than failing.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

/// Read a borrowed C string. Null and invalid UTF-8 both read as `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Free a C string allocated by `c_string`. Null is ignored.
pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
    Head = 5,
    Options = 6,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Head => FfiHttpMethod::Head,
            HttpMethod::Options => FfiHttpMethod::Options,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Patch => HttpMethod::Patch,
            FfiHttpMethod::Delete => HttpMethod::Delete,
            FfiHttpMethod::Head => HttpMethod::Head,
            FfiHttpMethod::Options => HttpMethod::Options,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `hyperdrive_build_*` functions. The C caller executes the
/// request and passes it back, together with the response, through
/// `hyperdrive_parse_response`. `body` is null when there is no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        let (body, body_len) = match req.body {
            Some(bytes) => {
                let len = bytes.len();
                (Box::into_raw(bytes.into_boxed_slice()) as *mut u8, len)
            }
            None => (std::ptr::null_mut(), 0),
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }

    /// Copy this request back into a core `HttpRequest`.
    ///
    /// # Safety
    /// All pointers must be as produced by `from_core`, or null.
    pub(crate) unsafe fn to_core(&self) -> HttpRequest {
        let headers = if self.headers.is_null() {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) }
                .iter()
                .filter_map(|h| {
                    let key = unsafe { read_str(h.key) }?;
                    let value = unsafe { read_str(h.value) }?;
                    Some((key.to_string(), value.to_string()))
                })
                .collect()
        };
        let body = if self.body.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(self.body, self.body_len) }.to_vec())
        };
        HttpRequest {
            method: self.method.into(),
            url: unsafe { read_str(self.url) }.unwrap_or_default().to_string(),
            headers,
            body,
        }
    }

    /// Release everything `from_core` allocated, including `req` itself.
    pub(crate) fn free(req: *mut Self) {
        if req.is_null() {
            return;
        }
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        if !req.body.is_null() {
            drop(unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.body, req.body_len))
            });
        }
        if !req.headers.is_null() {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request, then
/// passes a pointer to `hyperdrive_parse_response`. The FFI layer reads but
/// does not free these fields. `url` is the effective URL the response came
/// from; `content_type` may be null; `body` is null when there was no body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub url: *const c_char,
    pub content_type: *const c_char,
    pub body: *const u8,
    pub body_len: usize,
}

impl FfiHttpResponse {
    /// Split into a core `HttpResponse` and its optional body.
    ///
    /// # Safety
    /// Pointers must be null or valid for the lengths given.
    pub(crate) unsafe fn to_core(&self) -> (HttpResponse, Option<Vec<u8>>) {
        let headers = match unsafe { read_str(self.content_type) } {
            Some(ct) => vec![("content-type".to_string(), ct.to_string())],
            None => Vec::new(),
        };
        let body = if self.body.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(self.body, self.body_len) }.to_vec())
        };
        (
            HttpResponse {
                status: self.status,
                url: unsafe { read_str(self.url) }.unwrap_or_default().to_string(),
                headers,
            },
            body,
        )
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error categories returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidUri = 1,
    /// Reported by the host through `hyperdrive_parse_failure`.
    Transport = 2,
    InvalidArgument = 3,
    Panic = 4,
    NullArg = 5,
}

/// Tag that tells `hyperdrive_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiHttpRequest*`.
    Request = 1,
    /// `data` is a `char*` holding the representor as JSON.
    Representor = 2,
}

/// Result envelope for every build and parse operation.
///
/// On success `error_code` is `Ok`, the error strings are null, and `data`
/// points to the payload tagged by `data_tag`. On failure `error_code`
/// gives the category, `error_domain` / `domain_code` / `error_message`
/// carry the client error, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_domain: *mut c_char,
    pub domain_code: i64,
    pub error_message: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error: Option<(&str, i64, String)>,
        data_tag: FfiDataTag,
        data: *mut std::ffi::c_void,
    ) -> *mut Self {
        let (error_domain, domain_code, error_message) = match error {
            Some((domain, code, message)) => (c_string(domain), code, c_string(message)),
            None => (std::ptr::null_mut(), 0, std::ptr::null_mut()),
        };
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_domain,
            domain_code,
            error_message,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying an `FfiHttpRequest`.
    pub(crate) fn ok_request(req: HttpRequest) -> *mut Self {
        let data = FfiHttpRequest::from_core(req) as *mut std::ffi::c_void;
        Self::boxed(FfiErrorCode::Ok, None, FfiDataTag::Request, data)
    }

    /// Build a success result carrying representor JSON.
    pub(crate) fn ok_representor(json: String) -> *mut Self {
        let data = c_string(json) as *mut std::ffi::c_void;
        Self::boxed(FfiErrorCode::Ok, None, FfiDataTag::Representor, data)
    }

    /// Build an error result from a `ClientError`.
    pub(crate) fn from_error(err: ClientError) -> *mut Self {
        let error_code = match &err {
            ClientError::InvalidUri { .. } => FfiErrorCode::InvalidUri,
            ClientError::Transport(_) => FfiErrorCode::Transport,
        };
        Self::boxed(
            error_code,
            Some((err.domain(), err.code(), err.to_string())),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for an argument that could not be read.
    pub(crate) fn invalid_argument(name: &str, reason: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::InvalidArgument,
            Some(("ffi", 0, format!("invalid argument {name}: {reason}"))),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            Some(("ffi", 0, format!("null argument: {name}"))),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Panic,
            Some(("ffi", 0, msg.to_string())),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Release `result` and whatever its `data` points to.
    pub(crate) fn free(result: *mut Self) {
        if result.is_null() {
            return;
        }
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_domain);
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Request => FfiHttpRequest::free(result.data as *mut FfiHttpRequest),
            FfiDataTag::Representor => free_c_string(result.data as *mut c_char),
            FfiDataTag::None => {}
        }
    }
}
