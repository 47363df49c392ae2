//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`,
//! and tagged enums with explicit discriminants. Arrays are allocated as
//! boxed slices so they can be released from pointer and length alone.
//! Conversion and release helpers live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use catalog_core::{CatalogApp, Effect, HttpMethod, HttpRequest};

/// Opaque handle to a `CatalogApp`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiCatalogApp {
    pub(crate) inner: CatalogApp,
}

/// Convert a Rust string into an owned C string. Interior NULs cannot be
/// represented and are dropped.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).map_or(std::ptr::null_mut(), CString::into_raw)
}

/// Free a C string produced by `to_c_string`. Safe with null.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak a vector as a boxed slice, returning its pointer and length.
fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, usize) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len();
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim a slice leaked by `into_raw_slice`.
unsafe fn from_raw_slice<T>(ptr: *mut T, len: usize) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)).into_vec()
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
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data. The body is
/// binary (multipart) and may contain NULs, hence pointer + length.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: usize,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect::<Vec<_>>();
        let (headers, headers_len) = into_raw_slice(headers);
        let (body, body_len) = into_raw_slice(req.body.unwrap_or_default());

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: to_c_string(req.path),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }

    /// Release a request created by `from_core`. Safe with null.
    pub(crate) unsafe fn free(req: *mut Self) {
        if req.is_null() {
            return;
        }
        let req = Box::from_raw(req);
        free_c_string(req.path);
        for header in from_raw_slice(req.headers, req.headers_len) {
            free_c_string(header.key);
            free_c_string(header.value);
        }
        drop(from_raw_slice(req.body, req.body_len));
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Tells the host which fields of `FfiEffect` are meaningful.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiEffectTag {
    /// Execute `request`; report with `catalog_app_complete`/`catalog_app_fail` using `id`.
    Http = 0,
    /// Ask the user `text`; answer with a `delete_confirmed` event for book `id`.
    Confirm = 1,
    /// After `delay_ms`, dispatch a `timer_fired` event for timer `id`.
    StartTimer = 2,
    /// Scroll the element whose id is `text` into view.
    ScrollIntoView = 3,
}

#[repr(C)]
pub struct FfiEffect {
    pub tag: FfiEffectTag,
    pub id: u64,
    pub request: *mut FfiHttpRequest,
    pub delay_ms: u64,
    pub text: *mut c_char,
}

impl FfiEffect {
    fn from_core(effect: Effect) -> Self {
        let empty = |tag, id| FfiEffect {
            tag,
            id,
            request: std::ptr::null_mut(),
            delay_ms: 0,
            text: std::ptr::null_mut(),
        };
        match effect {
            Effect::Http {
                request_id,
                request,
            } => FfiEffect {
                request: FfiHttpRequest::from_core(request),
                ..empty(FfiEffectTag::Http, request_id.0)
            },
            Effect::Confirm { book_id, message } => FfiEffect {
                text: to_c_string(message),
                ..empty(FfiEffectTag::Confirm, book_id as u64)
            },
            Effect::StartTimer { timer_id, delay } => FfiEffect {
                delay_ms: delay.as_millis() as u64,
                ..empty(FfiEffectTag::StartTimer, timer_id.0)
            },
            Effect::ScrollIntoView { element_id } => FfiEffect {
                text: to_c_string(element_id),
                ..empty(FfiEffectTag::ScrollIntoView, 0)
            },
        }
    }
}

/// Effects produced by one call into the app, in the order they must run.
#[repr(C)]
pub struct FfiEffectList {
    pub items: *mut FfiEffect,
    pub len: usize,
}

impl FfiEffectList {
    pub(crate) fn from_core(effects: Vec<Effect>) -> *mut Self {
        let items = effects
            .into_iter()
            .map(FfiEffect::from_core)
            .collect::<Vec<_>>();
        let (items, len) = into_raw_slice(items);
        Box::into_raw(Box::new(FfiEffectList { items, len }))
    }

    /// Release a list created by `from_core`. Safe with null.
    pub(crate) unsafe fn free(list: *mut Self) {
        if list.is_null() {
            return;
        }
        let list = Box::from_raw(list);
        for effect in from_raw_slice(list.items, list.len) {
            FfiHttpRequest::free(effect.request);
            free_c_string(effect.text);
        }
    }
}
