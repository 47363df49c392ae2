//! Book catalog client core.
//!
//! # Overview
//! Implements the catalog page's behavior (list, detail view, create, edit,
//! delete, form and banner state) without touching the network, the DOM,
//! or a clock (host-does-IO pattern). The host feeds events into
//! `CatalogApp`, performs the returned effects, and renders `CatalogApp::render`.
//!
//! # Design
//! - `BookClient` is stateless: `build_*` produces requests, `parse_*`
//!   consumes responses.
//! - `CatalogApp` owns all mutable UI state; handlers map
//!   (event, state) to (new state, effects).
//! - `view` renders through an escaping virtual DOM, so book content is
//!   always literal text.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod types;
pub mod view;

pub use app::{CatalogApp, Effect, Event, GridState, HttpOutcome, Operation, RequestId, TimerId};
pub use client::BookClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{Book, BookForm, FormField, ImageUpload};
