//! Domain DTOs for the book catalog API.
//!
//! # Design
//! These types mirror the backend's JSON schema but are defined independently
//! of the mock-server crate. Integration tests catch any schema drift between
//! the two. `Book` is server-owned: the client only ever holds it for the
//! duration of a render pass.

use serde::{Deserialize, Serialize};

/// A single book record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Book {
    /// Price as shown on cards and in the detail view.
    pub fn display_price(&self) -> String {
        format_price(self.price)
    }
}

/// Format a price with a dollar sign and exactly two fraction digits.
/// Half-cent ties round away from zero.
pub fn format_price(price: f64) -> String {
    let cents = (price * 100.0).round() / 100.0;
    format!("${cents:.2}")
}

/// A file picked in the form's image input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Raw values of the create/edit form.
///
/// `price` stays as typed text; the backend parses it. `book_id` is the
/// hidden identifier field and is only set while editing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookForm {
    pub book_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub price: String,
    pub image: Option<ImageUpload>,
}

impl BookForm {
    /// Fill the form from a fetched book, as the edit operation does.
    /// The file input cannot be pre-filled, so any selected image is dropped.
    pub fn populate(&mut self, book: &Book) {
        self.book_id = Some(book.id);
        self.title = book.title.clone();
        self.description = book.description.clone();
        self.price = book.price.to_string();
        self.image = None;
    }

    pub fn clear(&mut self) {
        *self = BookForm::default();
    }
}

/// Names of the editable text fields, used by `Event::FieldChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Title,
    Description,
    Price,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_deserializes_camel_case_fields() {
        let book: Book = serde_json::from_str(
            r#"{"id":7,"title":"Dune","description":"Sand","price":9.5,
                "imagePath":"a.png","imageUrl":"/api/books/images/a.png"}"#,
        )
        .unwrap();
        assert_eq!(book.id, 7);
        assert_eq!(book.image_url.as_deref(), Some("/api/books/images/a.png"));
        assert_eq!(book.image_path.as_deref(), Some("a.png"));
    }

    #[test]
    fn book_without_image_fields_defaults_to_none() {
        let book: Book =
            serde_json::from_str(r#"{"id":1,"title":"T","description":"D","price":1}"#).unwrap();
        assert!(book.image_url.is_none());
        assert!(book.image_path.is_none());
    }

    #[test]
    fn null_image_url_is_none() {
        let book: Book = serde_json::from_str(
            r#"{"id":1,"title":"T","description":"D","price":1,"imageUrl":null}"#,
        )
        .unwrap();
        assert!(book.image_url.is_none());
    }

    #[test]
    fn price_uses_two_fraction_digits() {
        assert_eq!(format_price(12.0), "$12.00");
        assert_eq!(format_price(3.456), "$3.46");
        assert_eq!(format_price(0.1), "$0.10");
    }

    #[test]
    fn price_ties_round_up() {
        assert_eq!(format_price(0.125), "$0.13");
        assert_eq!(format_price(12.625), "$12.63");
        assert_eq!(format_price(7.5), "$7.50");
    }

    #[test]
    fn populate_copies_fields_and_drops_image() {
        let mut form = BookForm {
            image: Some(ImageUpload {
                file_name: "x.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![1],
            }),
            ..BookForm::default()
        };
        let book = Book {
            id: 4,
            title: "Emma".to_string(),
            description: "Austen".to_string(),
            price: 7.25,
            image_path: None,
            image_url: None,
        };
        form.populate(&book);
        assert_eq!(form.book_id, Some(4));
        assert_eq!(form.title, "Emma");
        assert_eq!(form.price, "7.25");
        assert!(form.image.is_none());

        form.clear();
        assert_eq!(form, BookForm::default());
    }
}
