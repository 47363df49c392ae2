//! Stateless HTTP request builder and response parser for the book API.
//!
//! # Design
//! `BookClient` holds only the collection URL and carries no mutable state
//! between calls. Each CRUD operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the actual HTTP round-trip.
//!
//! Any 2xx status counts as success. The backend's exact codes (201 on
//! create, 204 on delete) are not required.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::MultipartForm;
use crate::types::{Book, BookForm};

/// Path of the book collection relative to the server root.
pub const BOOKS_PATH: &str = "/api/books";

/// Synchronous, stateless client for the book API.
#[derive(Debug, Clone)]
pub struct BookClient {
    collection_url: String,
}

impl BookClient {
    /// `base_url` is the server origin; an empty string targets the page's
    /// own origin with a root-relative path.
    pub fn new(base_url: &str) -> Self {
        Self {
            collection_url: format!("{}{BOOKS_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{id}", self.collection_url)
    }

    pub fn build_list_books(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.collection_url.clone(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_book(&self, id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_book(&self, form: &BookForm) -> HttpRequest {
        self.build_create_book_with(form, MultipartForm::new())
    }

    /// Like `build_create_book` but encodes into the supplied (empty) form,
    /// which lets callers fix the boundary.
    pub fn build_create_book_with(&self, form: &BookForm, multipart: MultipartForm) -> HttpRequest {
        multipart_request(HttpMethod::Post, self.collection_url.clone(), form, multipart)
    }

    pub fn build_update_book(&self, id: i64, form: &BookForm) -> HttpRequest {
        self.build_update_book_with(id, form, MultipartForm::new())
    }

    pub fn build_update_book_with(
        &self,
        id: i64,
        form: &BookForm,
        multipart: MultipartForm,
    ) -> HttpRequest {
        multipart_request(HttpMethod::Put, self.item_url(id), form, multipart)
    }

    pub fn build_delete_book(&self, id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_books(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn multipart_request(
    method: HttpMethod,
    path: String,
    form: &BookForm,
    multipart: MultipartForm,
) -> HttpRequest {
    let mut multipart = multipart
        .text("title", &form.title)
        .text("description", &form.description)
        .text("price", &form.price);
    if let Some(image) = &form.image {
        multipart = multipart.file("image", &image.file_name, &image.content_type, &image.bytes);
    }
    HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), multipart.content_type())],
        body: Some(multipart.encode()),
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageUpload;

    const BOOK_JSON: &str = r#"{"id":1,"title":"Test","description":"Desc","price":12.5}"#;

    fn client() -> BookClient {
        BookClient::new("http://localhost:3000")
    }

    fn form() -> BookForm {
        BookForm {
            book_id: None,
            title: "Dune".to_string(),
            description: "Desert planet".to_string(),
            price: "9.99".to_string(),
            image: None,
        }
    }

    #[test]
    fn build_list_books_produces_correct_request() {
        let req = client().build_list_books();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/books");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn empty_base_url_targets_same_origin() {
        let req = BookClient::new("").build_get_book(3);
        assert_eq!(req.path, "/api/books/3");
    }

    #[test]
    fn build_get_book_produces_correct_request() {
        let req = client().build_get_book(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/books/42");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_create_book_posts_multipart_to_collection() {
        let multipart = MultipartForm::with_boundary("B");
        let req = client().build_create_book_with(&form(), multipart);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/books");
        assert_eq!(req.header("Content-Type"), Some("multipart/form-data; boundary=B"));

        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.contains("name=\"title\"\r\n\r\nDune\r\n"));
        assert!(body.contains("name=\"description\"\r\n\r\nDesert planet\r\n"));
        assert!(body.contains("name=\"price\"\r\n\r\n9.99\r\n"));
        assert!(!body.contains("name=\"image\""));
    }

    #[test]
    fn build_update_book_puts_to_item_with_image() {
        let mut input = form();
        input.image = Some(ImageUpload {
            file_name: "cover.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: b"jpegdata".to_vec(),
        });
        let req = client().build_update_book(7, &input);
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/api/books/7");

        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.contains("name=\"image\"; filename=\"cover.jpg\"\r\nContent-Type: image/jpeg"));
        assert!(body.contains("jpegdata"));
    }

    #[test]
    fn build_delete_book_produces_correct_request() {
        let req = client().build_delete_book(5);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:3000/api/books/5");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_list_books_success() {
        let response = HttpResponse::new(200, format!("[{BOOK_JSON}]"));
        let books = client().parse_list_books(response).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Test");
        assert_eq!(books[0].price, 12.5);
    }

    #[test]
    fn parse_list_books_empty() {
        let books = client().parse_list_books(HttpResponse::new(200, "[]")).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn parse_get_book_not_found() {
        let err = client().parse_get_book(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_create_book_accepts_any_2xx() {
        let created = client().parse_create_book(HttpResponse::new(201, BOOK_JSON)).unwrap();
        assert_eq!(created.id, 1);
        let ok = client().parse_create_book(HttpResponse::new(200, BOOK_JSON)).unwrap();
        assert_eq!(ok.title, "Test");
    }

    #[test]
    fn parse_create_book_server_error() {
        let response = HttpResponse::new(500, "internal error");
        let err = client().parse_create_book(response).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn parse_update_book_bad_request() {
        let response = HttpResponse::new(400, r#"{"error":"File upload error"}"#);
        let err = client().parse_update_book(response).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 400, .. }));
    }

    #[test]
    fn parse_delete_book_ignores_body() {
        assert!(client().parse_delete_book(HttpResponse::new(204, "")).is_ok());
        assert!(client().parse_delete_book(HttpResponse::new(200, "whatever")).is_ok());
    }

    #[test]
    fn parse_delete_book_not_found() {
        let err = client().parse_delete_book(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = BookClient::new("http://localhost:3000/");
        assert_eq!(client.build_list_books().path, "http://localhost:3000/api/books");
    }

    #[test]
    fn parse_list_books_bad_json() {
        let err = client().parse_list_books(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
