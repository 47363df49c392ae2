//! Error types for the book catalog client.
//!
//! # Design
//! `NotFound` keeps its own variant so logs can tell a vanished book from a
//! server fault, but every variant collapses into the same per-operation
//! banner in the UI. `Transport` is reported by the host when the request
//! never produced a response at all.

use thiserror::Error;

/// Errors produced while building requests or interpreting responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404: the requested book does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request never completed (DNS, connection refused, aborted...).
    #[error("transport failed: {0}")]
    Transport(String),
}
