//! Markup rendering through a minimal virtual DOM.
//!
//! # Design
//! Renderers build a `Node` tree instead of concatenating strings. Text and
//! attribute values are escaped when the tree is serialized, and there is no
//! node type that carries raw markup, so book content can never be
//! interpreted as HTML. Hosts either serialize the tree with `to_string()`
//! and swap it into the page, or walk it and create DOM nodes directly.
//!
//! Element ids and class names match the stylesheet the page ships with.

use std::fmt;

use crate::app::{Banner, CatalogApp, GridState};
use crate::types::{Book, BookForm};

pub const FORM_SECTION_ID: &str = "form-section";

const BOOK_ICON: &str = "\u{1F4D6}";
const SHELF_ICON: &str = "\u{1F4DA}";

/// A node in the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &["img", "input", "br", "hr"];

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Add a boolean attribute such as `required`.
    pub fn flag(self, name: &'static str) -> Self {
        self.attr(name, "")
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// Inline `display` toggle, the way the page hides and reveals regions.
    pub fn shown(self, visible: bool, display: &str) -> Self {
        let value = if visible { display } else { "none" };
        self.attr("style", format!("display: {value};"))
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn tag(&self) -> &str {
        self.tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    /// Whether the element has an inline `display: none`.
    pub fn is_hidden(&self) -> bool {
        self.get_attr("style")
            .is_some_and(|s| s.replace(' ', "").contains("display:none"))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Depth-first search for the element with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        let element = self.as_element()?;
        if element.get_attr("id") == Some(id) {
            return Some(element);
        }
        element.children.iter().find_map(|c| c.find_by_id(id))
    }

    /// All descendant elements (including self) carrying `class`.
    pub fn find_all_by_class<'a>(&'a self, class: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_class(class, &mut found);
        found
    }

    fn collect_class<'a>(&'a self, class: &str, out: &mut Vec<&'a Element>) {
        if let Node::Element(element) = self {
            if element.has_class(class) {
                out.push(element);
            }
            for child in &element.children {
                child.collect_class(class, out);
            }
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Element(e) => e.text_content(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.write_str(&escape(text, false)),
            Node::Element(element) => fmt::Display::fmt(element, f),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            if value.is_empty() {
                write!(f, " {name}")?;
            } else {
                write!(f, " {name}=\"{}\"", escape(value, true))?;
            }
        }
        f.write_str(">")?;
        if VOID_TAGS.contains(&self.tag) {
            return Ok(());
        }
        for child in &self.children {
            fmt::Display::fmt(child, f)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

fn escape(value: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\'' if attribute => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Catalog renderers
// ---------------------------------------------------------------------------

fn book_image(book: &Book, image_class: &str, placeholder_class: &str) -> Element {
    match &book.image_url {
        Some(url) => Element::new("img")
            .attr("src", url.as_str())
            .attr("alt", book.title.as_str())
            .class(image_class),
        None => Element::new("div").class(placeholder_class).text(BOOK_ICON),
    }
}

fn action_buttons(book: &Book) -> Element {
    let id = book.id.to_string();
    Element::new("div")
        .class("book-actions")
        .child(
            Element::new("button")
                .class("btn btn-edit")
                .attr("data-action", "edit")
                .attr("data-book-id", id.as_str())
                .attr("title", "Edit book")
                .text("\u{270F}\u{FE0F} Edit"),
        )
        .child(
            Element::new("button")
                .class("btn btn-danger")
                .attr("data-action", "delete")
                .attr("data-book-id", id.as_str())
                .attr("title", "Delete book")
                .text("\u{1F5D1}\u{FE0F} Delete"),
        )
}

/// One card in the grid. Clicks outside `.book-actions` open the detail view.
pub fn book_card(book: &Book) -> Element {
    Element::new("div")
        .class("book-card")
        .attr("data-book-id", book.id.to_string())
        .child(Element::new("div").class("book-image").child(book_image(
            book,
            "card-image",
            "image-placeholder",
        )))
        .child(
            Element::new("div")
                .class("book-info")
                .child(Element::new("h3").class("book-title").text(book.title.as_str()))
                .child(
                    Element::new("p")
                        .class("book-description")
                        .text(book.description.as_str()),
                )
                .child(Element::new("div").class("book-price").text(book.display_price()))
                .child(action_buttons(book)),
        )
}

pub fn empty_state() -> Element {
    Element::new("div")
        .class("empty-state")
        .child(Element::new("div").class("icon").text(SHELF_ICON))
        .child(Element::new("h3").text("No books yet"))
        .child(Element::new("p").text("Add your first book to get started!"))
}

pub fn books_grid(grid: &GridState) -> Element {
    let grid_el = Element::new("div").id("books-grid").class("books-grid");
    match grid {
        GridState::Cleared => grid_el,
        GridState::Books(books) if books.is_empty() => grid_el.child(empty_state()),
        GridState::Books(books) => grid_el.children(books.iter().map(book_card)),
    }
}

/// Detail modal; its action buttons carry `data-closes-modal`.
pub fn book_modal(book: Option<&Book>) -> Element {
    let mut body = Element::new("div").id("modal-body");
    if let Some(book) = book {
        body = body
            .child(book_image(book, "modal-image", "modal-image-placeholder"))
            .child(Element::new("h2").class("modal-title").text(book.title.as_str()))
            .child(
                Element::new("p")
                    .class("modal-description")
                    .text(book.description.as_str()),
            )
            .child(
                Element::new("div")
                    .class("modal-footer")
                    .child(Element::new("div").class("book-price").text(book.display_price()))
                    .child(action_buttons(book).attr("data-closes-modal", "true")),
            );
    }
    Element::new("div")
        .id("book-modal")
        .class("modal")
        .shown(book.is_some(), "block")
        .child(
            Element::new("div")
                .class("modal-content")
                .child(
                    Element::new("span")
                        .class("close")
                        .attr("data-action", "close-modal")
                        .text("\u{00D7}"),
                )
                .child(body),
        )
}

pub fn book_form(form: &BookForm, success_banners: &[Banner]) -> Element {
    let edit_mode = form.book_id.is_some();
    let (heading, submit) = if edit_mode {
        ("Edit Book", "Update Book")
    } else {
        ("Add New Book", "Add Book")
    };
    let banners = success_banners.iter().rev().map(|banner| {
        Element::new("div")
            .class("success-message")
            .attr("data-banner-id", banner.id.to_string())
            .text(banner.message.as_str())
    });

    Element::new("section")
        .id(FORM_SECTION_ID)
        .class("form-section")
        .children(banners)
        .child(Element::new("h2").id("form-title").text(heading))
        .child(
            Element::new("form")
                .id("book-form")
                .attr("enctype", "multipart/form-data")
                .child(
                    Element::new("input")
                        .attr("type", "hidden")
                        .id("book-id")
                        .attr("value", form.book_id.map(|id| id.to_string()).unwrap_or_default()),
                )
                .child(labelled(
                    "title",
                    "Title",
                    Element::new("input")
                        .attr("type", "text")
                        .id("title")
                        .attr("name", "title")
                        .attr("value", form.title.as_str())
                        .flag("required"),
                ))
                .child(labelled(
                    "description",
                    "Description",
                    Element::new("textarea")
                        .id("description")
                        .attr("name", "description")
                        .flag("required")
                        .text(form.description.as_str()),
                ))
                .child(labelled(
                    "price",
                    "Price",
                    Element::new("input")
                        .attr("type", "number")
                        .id("price")
                        .attr("name", "price")
                        .attr("min", "0")
                        .attr("step", "0.01")
                        .attr("value", form.price.as_str())
                        .flag("required"),
                ))
                .child(labelled(
                    "image",
                    "Cover image",
                    Element::new("input")
                        .attr("type", "file")
                        .id("image")
                        .attr("name", "image")
                        .attr("accept", "image/*"),
                ))
                .child(
                    Element::new("div")
                        .class("form-actions")
                        .child(
                            Element::new("button")
                                .attr("type", "submit")
                                .class("btn btn-primary")
                                .child(Element::new("span").id("submit-text").text(submit)),
                        )
                        .child(
                            Element::new("button")
                                .attr("type", "button")
                                .id("cancel-btn")
                                .class("btn btn-secondary")
                                .shown(edit_mode, "inline-block")
                                .text("Cancel"),
                        ),
                ),
        )
}

fn labelled(id: &str, label: &str, input: Element) -> Element {
    Element::new("div")
        .class("form-group")
        .child(Element::new("label").attr("for", id).text(label))
        .child(input)
}

pub fn error_banner(message: Option<&str>) -> Element {
    Element::new("div")
        .id("error-message")
        .class("error-message")
        .shown(message.is_some(), "block")
        .text(message.unwrap_or_default())
}

pub fn loading_indicator(loading: bool) -> Element {
    Element::new("div")
        .id("loading")
        .class("loading")
        .shown(loading, "block")
        .text("Loading books...")
}

/// The whole application body.
pub fn page(app: &CatalogApp) -> Node {
    Element::new("div")
        .id("app")
        .child(book_form(app.form(), app.success_banners()))
        .child(
            Element::new("section")
                .class("books-section")
                .child(loading_indicator(app.is_loading()))
                .child(error_banner(app.error_banner()))
                .child(books_grid(app.grid())),
        )
        .child(book_modal(app.modal()))
        .into()
}
