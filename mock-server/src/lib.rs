//! In-memory book catalog backend.
//!
//! Serves the `/api/books` REST contract the catalog client consumes:
//! multipart create/update with an optional cover image, JSON reads, and
//! the stored images themselves. Nothing is persisted.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const IMAGES_PATH: &str = "/api/books/images";

/// Server settings, read from the environment by `main`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// `BIND_ADDRESS`, `PORT` and `MAX_UPLOAD_BYTES`; unset or unparsable
    /// values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: env_parse("PORT").unwrap_or(defaults.port),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_path: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug)]
struct StoredImage {
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Store {
    books: BTreeMap<i64, Book>,
    images: HashMap<String, StoredImage>,
    last_id: i64,
}

impl Store {
    fn set_image(&mut self, book_id: i64, image: ImageInput) {
        let Some(book) = self.books.get_mut(&book_id) else {
            return;
        };
        if let Some(old) = book.image_path.take() {
            self.images.remove(&old);
        }
        let file_name = format!("{}{}", Uuid::new_v4(), image.extension);
        book.image_url = Some(format!("{IMAGES_PATH}/{file_name}"));
        book.image_path = Some(file_name.clone());
        self.images.insert(
            file_name,
            StoredImage {
                content_type: image.content_type,
                bytes: image.bytes,
            },
        );
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    max_upload_bytes: usize,
}

/// Error responses, shaped `{"error": ..., "message": ...}`.
#[derive(Debug)]
pub enum ServerError {
    NotFound(i64),
    BadRequest(String),
    PayloadTooLarge,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ServerError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "Resource not found",
                format!("Book not found with id: {id}"),
            ),
            ServerError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "File upload error", message)
            }
            ServerError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "File size exceeds maximum limit",
                "Maximum upload size exceeded".to_string(),
            ),
        };
        (
            status,
            Json(serde_json::json!({ "error": error, "message": message })),
        )
            .into_response()
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::BadRequest(err.body_text())
        }
    }
}

pub fn app() -> Router {
    app_with_config(&ServerConfig::default())
}

pub fn app_with_config(config: &ServerConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        max_upload_bytes: config.max_upload_bytes,
    };
    Router::new()
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/api/books/images/{filename}", get(get_image))
        // Room for the text fields and multipart framing around the image.
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, &ServerConfig::default()).await
}

pub async fn serve(listener: TcpListener, config: &ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_config(config)).await
}

#[derive(Debug)]
struct ImageInput {
    extension: String,
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct BookInput {
    title: String,
    description: String,
    price: f64,
    image: Option<ImageInput>,
}

async fn read_book_input(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<BookInput, ServerError> {
    let mut title = None;
    let mut description = None;
    let mut price = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "description" => description = Some(field.text().await?),
            "price" => price = Some(field.text().await?),
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                image = Some(validate_image(
                    file_name.as_deref(),
                    content_type,
                    bytes.to_vec(),
                    max_upload_bytes,
                )?);
            }
            _ => {}
        }
    }

    let price = required(price, "price")?;
    let price: f64 = price
        .trim()
        .parse()
        .ok()
        .filter(|p: &f64| p.is_finite())
        .ok_or_else(|| ServerError::BadRequest(format!("Invalid price: {price}")))?;

    Ok(BookInput {
        title: required(title, "title")?,
        description: required(description, "description")?,
        price,
        image,
    })
}

fn required(value: Option<String>, name: &str) -> Result<String, ServerError> {
    value.ok_or_else(|| ServerError::BadRequest(format!("Required field '{name}' is missing")))
}

fn validate_image(
    file_name: Option<&str>,
    content_type: Option<String>,
    bytes: Vec<u8>,
    max_upload_bytes: usize,
) -> Result<ImageInput, ServerError> {
    if bytes.len() > max_upload_bytes {
        return Err(ServerError::PayloadTooLarge);
    }
    let content_type = content_type
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| ServerError::BadRequest("Only image files are allowed".to_string()))?;

    let extension = match file_name.and_then(|n| n.rsplit_once('.')) {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
                return Err(ServerError::BadRequest(format!(
                    "Invalid image file extension. Allowed: {}",
                    ALLOWED_EXTENSIONS.join(", ")
                )));
            }
            format!(".{ext}")
        }
        None => ".jpg".to_string(),
    };

    Ok(ImageInput {
        extension,
        content_type,
        bytes,
    })
}

async fn list_books(State(state): State<AppState>) -> Json<Vec<Book>> {
    let store = state.db.read().await;
    Json(store.books.values().cloned().collect())
}

async fn create_book(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Book>), ServerError> {
    let input = read_book_input(multipart, state.max_upload_bytes).await?;
    let mut store = state.db.write().await;
    store.last_id += 1;
    let id = store.last_id;
    store.books.insert(
        id,
        Book {
            id,
            title: input.title,
            description: input.description,
            price: input.price,
            image_path: None,
            image_url: None,
        },
    );
    if let Some(image) = input.image {
        store.set_image(id, image);
    }
    info!(id, "book created");
    let book = store.books[&id].clone();
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ServerError> {
    let store = state.db.read().await;
    store
        .books
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ServerError::NotFound(id))
}

async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Book>, ServerError> {
    let input = read_book_input(multipart, state.max_upload_bytes).await?;
    let mut store = state.db.write().await;
    let book = store.books.get_mut(&id).ok_or(ServerError::NotFound(id))?;
    book.title = input.title;
    book.description = input.description;
    book.price = input.price;
    if let Some(image) = input.image {
        store.set_image(id, image);
    }
    info!(id, "book updated");
    Ok(Json(store.books[&id].clone()))
}

async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    let mut store = state.db.write().await;
    let book = store.books.remove(&id).ok_or(ServerError::NotFound(id))?;
    if let Some(path) = book.image_path {
        store.images.remove(&path);
    }
    info!(id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let store = state.db.read().await;
    match store.images.get(&filename) {
        Some(image) => (
            [
                (header::CONTENT_TYPE, image.content_type.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{filename}\""),
                ),
            ],
            image.bytes.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
