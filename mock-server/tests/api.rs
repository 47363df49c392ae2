use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_config, Book, ServerConfig};
use tower::ServiceExt;

const BOUNDARY: &str = "XBOUNDARYX";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// (name, file name + content type, content)
type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, &'a [u8]);

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((file_name, content_type)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<axum::body::Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(multipart_body(parts)))
        .unwrap()
}

fn book_parts<'a>(title: &'a str, price: &'a str) -> Vec<Part<'a>> {
    vec![
        ("title", None, title.as_bytes()),
        ("description", None, &b"A description"[..]),
        ("price", None, price.as_bytes()),
    ]
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

// --- list ---

#[tokio::test]
async fn list_books_empty() {
    let resp = app().oneshot(get("/api/books")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let books: Vec<Book> = body_json(resp).await;
    assert!(books.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_book_returns_201() {
    let resp = app()
        .oneshot(multipart_request("POST", "/api/books", &book_parts("Dune", "9.99")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let book: Book = body_json(resp).await;
    assert_eq!(book.id, 1);
    assert_eq!(book.title, "Dune");
    assert_eq!(book.price, 9.99);
    assert!(book.image_url.is_none());
}

#[tokio::test]
async fn create_book_with_image_sets_image_url() {
    let mut parts = book_parts("Dune", "5");
    parts.push(("image", Some(("cover.png", "image/png")), &b"\x89PNG fake"[..]));
    let resp = app()
        .oneshot(multipart_request("POST", "/api/books", &parts))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let book: Book = body_json(resp).await;
    let url = book.image_url.unwrap();
    assert!(url.starts_with("/api/books/images/"));
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn create_book_with_empty_image_is_ignored() {
    let mut parts = book_parts("Dune", "5");
    parts.push(("image", Some(("", "application/octet-stream")), &b""[..]));
    let resp = app()
        .oneshot(multipart_request("POST", "/api/books", &parts))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let book: Book = body_json(resp).await;
    assert!(book.image_url.is_none());
}

#[tokio::test]
async fn create_book_rejects_non_image_upload() {
    let mut parts = book_parts("Dune", "5");
    parts.push(("image", Some(("notes.txt", "text/plain")), &b"hello"[..]));
    let resp = app()
        .oneshot(multipart_request("POST", "/api/books", &parts))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "Only image files are allowed");
}

#[tokio::test]
async fn create_book_missing_price_returns_400() {
    let parts: Vec<Part<'_>> = vec![("title", None, &b"Dune"[..]), ("description", None, &b"d"[..])];
    let resp = app()
        .oneshot(multipart_request("POST", "/api/books", &parts))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_book_bad_price_returns_400() {
    let resp = app()
        .oneshot(multipart_request("POST", "/api/books", &book_parts("Dune", "cheap")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_image_returns_413() {
    let config = ServerConfig {
        max_upload_bytes: 16,
        ..ServerConfig::default()
    };
    let big = [0u8; 32];
    let mut parts = book_parts("Dune", "5");
    parts.push(("image", Some(("big.png", "image/png")), &big[..]));
    let resp = app_with_config(&config)
        .oneshot(multipart_request("POST", "/api/books", &parts))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// --- get ---

#[tokio::test]
async fn get_book_not_found() {
    let resp = app().oneshot(get("/api/books/42")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "Book not found with id: 42");
}

#[tokio::test]
async fn get_book_bad_id_returns_400() {
    let resp = app().oneshot(get("/api/books/not-a-number")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- update ---

#[tokio::test]
async fn update_book_not_found() {
    let resp = app()
        .oneshot(multipart_request("PUT", "/api/books/42", &book_parts("Nope", "1")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- delete ---

#[tokio::test]
async fn delete_book_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/books/42")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- images ---

#[tokio::test]
async fn image_path_traversal_is_rejected() {
    let resp = app()
        .oneshot(get("/api/books/images/..%2Fsecret"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_image_returns_404() {
    let resp = app().oneshot(get("/api/books/images/missing.png")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create with an image
    let mut parts = book_parts("Walk dog", "12.5");
    parts.push(("image", Some(("dog.jpg", "image/jpeg")), &b"jpeg-bytes"[..]));
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(multipart_request("POST", "/api/books", &parts))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Book = body_json(resp).await;
    let id = created.id;
    let first_image = created.image_url.clone().unwrap();

    // the image is served back with its content type
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&first_image))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(&body_bytes(resp).await[..], b"jpeg-bytes");

    // list contains the one book
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/books"))
        .await
        .unwrap();
    let books: Vec<Book> = body_json(resp).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, id);

    // update without an image keeps the old one
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(multipart_request(
            "PUT",
            &format!("/api/books/{id}"),
            &book_parts("Walk cat", "13"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Book = body_json(resp).await;
    assert_eq!(updated.title, "Walk cat");
    assert_eq!(updated.price, 13.0);
    assert_eq!(updated.image_url.as_deref(), Some(first_image.as_str()));

    // update with a new image replaces the old one
    let mut parts = book_parts("Walk cat", "13");
    parts.push(("image", Some(("cat.webp", "image/webp")), &b"webp"[..]));
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(multipart_request("PUT", &format!("/api/books/{id}"), &parts))
        .await
        .unwrap();
    let replaced: Book = body_json(resp).await;
    assert_ne!(replaced.image_url.as_deref(), Some(first_image.as_str()));
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&first_image))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/books/{id}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete: 404, and the image went with it
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/api/books/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(replaced.image_url.as_deref().unwrap()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete: empty
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/books"))
        .await
        .unwrap();
    let books: Vec<Book> = body_json(resp).await;
    assert!(books.is_empty());
}
