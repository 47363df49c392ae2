//! C-ABI wrapper around `catalog-core`.
//!
//! # Overview
//! Exposes the catalog state machine through `extern "C"` functions so a
//! page shell (JavaScript over wasm, or any language with a C FFI) can drive
//! it: forward UI events, perform the returned effects, report HTTP
//! outcomes, and swap in the rendered markup.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - UI events travel as JSON (`{"type": "edit_clicked", "book_id": 3}`);
//!   binary data (the selected image, request bodies) travels as pointer +
//!   length.
//! - Every call that can change state returns an `FfiEffectList`, null when
//!   an argument is invalid.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `catalog_free_*` function.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use catalog_core::{CatalogApp, ClientConfig, Event, HttpResponse, ImageUpload, RequestId};

use types::*;

/// Read a C string as UTF-8. `None` for null or invalid UTF-8.
unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

/// Run `f` against the app behind `app` and package the effects.
fn with_app<F>(app: *mut FfiCatalogApp, f: F) -> *mut FfiEffectList
where
    F: FnOnce(&mut CatalogApp) -> Option<Vec<catalog_core::Effect>> + std::panic::UnwindSafe,
{
    catch_unwind(|| {
        if app.is_null() {
            return std::ptr::null_mut();
        }
        let app = unsafe { &mut (*app).inner };
        match f(app) {
            Some(effects) => FfiEffectList::from_core(effects),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// App lifecycle
// ---------------------------------------------------------------------------

/// Create a new app talking to the server at `base_url` (`""` for the page's
/// own origin).
///
/// Returns null if `base_url` is null or not UTF-8.
/// The caller must free the returned pointer with `catalog_app_free`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_app_new(base_url: *const c_char) -> *mut FfiCatalogApp {
    catch_unwind(|| {
        let Some(url) = (unsafe { read_str(base_url) }) else {
            return std::ptr::null_mut();
        };
        let app = CatalogApp::new(ClientConfig::new(url));
        Box::into_raw(Box::new(FfiCatalogApp { inner: app }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free an app created by `catalog_app_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_app_free(app: *mut FfiCatalogApp) {
    if !app.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(app) });
        });
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Dispatch a UI event encoded as JSON.
///
/// Returns null if an argument is null or the JSON is not a known event.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_app_dispatch(
    app: *mut FfiCatalogApp,
    event_json: *const c_char,
) -> *mut FfiEffectList {
    with_app(app, |app| {
        let json = unsafe { read_str(event_json) }?;
        let event: Event = serde_json::from_str(json).ok()?;
        Some(app.handle(event))
    })
}

/// Record the file picked in the image input. A null `file_name` clears the
/// selection; a `file_name` that is not valid UTF-8 returns null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_app_select_image(
    app: *mut FfiCatalogApp,
    file_name: *const c_char,
    content_type: *const c_char,
    bytes: *const u8,
    len: usize,
) -> *mut FfiEffectList {
    with_app(app, |app| {
        let image = if file_name.is_null() {
            None
        } else {
            let name = unsafe { read_str(file_name) }?;
            let content_type = unsafe { read_str(content_type) }.unwrap_or_default();
            let bytes = if bytes.is_null() || len == 0 {
                Vec::new()
            } else {
                unsafe { std::slice::from_raw_parts(bytes, len) }.to_vec()
            };
            Some(ImageUpload {
                file_name: name.to_string(),
                content_type: content_type.to_string(),
                bytes,
            })
        };
        Some(app.handle(Event::ImageSelected { image }))
    })
}

/// Report the response to the request identified by `request_id`.
/// `body` is `body_len` raw bytes, decoded as UTF-8 with invalid sequences
/// replaced. A null `body` is treated as empty.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_app_complete(
    app: *mut FfiCatalogApp,
    request_id: u64,
    status: u16,
    body: *const u8,
    body_len: usize,
) -> *mut FfiEffectList {
    with_app(app, |app| {
        let body = if body.is_null() || body_len == 0 {
            String::new()
        } else {
            String::from_utf8_lossy(unsafe { std::slice::from_raw_parts(body, body_len) })
                .into_owned()
        };
        Some(app.handle(Event::HttpCompleted {
            request_id: RequestId(request_id),
            outcome: Ok(HttpResponse::new(status, body)),
        }))
    })
}

/// Report that the request identified by `request_id` never produced a
/// response (network error, aborted fetch).
#[unsafe(no_mangle)]
pub extern "C" fn catalog_app_fail(
    app: *mut FfiCatalogApp,
    request_id: u64,
    message: *const c_char,
) -> *mut FfiEffectList {
    with_app(app, |app| {
        let message = unsafe { read_str(message) }.unwrap_or("transport error");
        Some(app.handle(Event::HttpCompleted {
            request_id: RequestId(request_id),
            outcome: Err(message.to_string()),
        }))
    })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the current page body as escaped HTML.
///
/// Returns null if `app` is null. Free with `catalog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_app_render(app: *const FfiCatalogApp) -> *mut c_char {
    catch_unwind(|| {
        if app.is_null() {
            return std::ptr::null_mut();
        }
        let app = unsafe { &(*app).inner };
        to_c_string(app.render().to_string())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiEffectList` returned by any `catalog_app_*` function,
/// including the requests and strings inside it. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_effects(list: *mut FfiEffectList) {
    if list.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiEffectList::free(list) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
