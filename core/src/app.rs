//! The catalog client state machine.
//!
//! # Design
//! `CatalogApp` is the single stateful object behind the page. The host
//! feeds it `Event`s (user actions, HTTP completions, timer expiries) and
//! performs the `Effect`s it returns; the app itself never blocks, sleeps,
//! or touches the network. Every operation is one request: its failure is
//! logged and turned into the operation's error banner, leaving the rest of
//! the UI as it was.
//!
//! Responses are matched to the operation that issued them through a
//! `RequestId`. Overlapping operations are not ordered; whichever response
//! arrives last wins for the region it updates. Banner timers are never
//! cancelled, so an older error timer may hide a newer error message.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::client::BookClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Book, BookForm, FormField, ImageUpload};
use crate::view::{self, Node, FORM_SECTION_ID};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this book?";
const LIST_FAILED: &str = "Failed to load books. Please make sure the server is running.";
const LOAD_FAILED: &str = "Failed to load book details. Please try again.";
const DELETE_FAILED: &str = "Failed to delete book. Please try again.";
const DELETE_SUCCEEDED: &str = "Book deleted successfully!";

/// Identifies an in-flight request so its outcome can be routed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

/// Identifies a banner dismissal timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u64);

/// What the book grid currently displays.
#[derive(Debug, Clone, PartialEq)]
pub enum GridState {
    /// Nothing: a list request is in flight or the last one failed.
    Cleared,
    /// The last fetched collection; empty renders the empty-state placeholder.
    Books(Vec<Book>),
}

/// A success notification shown above the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: u64,
    pub message: String,
}

/// Whether a form submission creates a book or updates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update(i64),
}

impl SubmitMode {
    fn success_message(&self) -> &'static str {
        match self {
            SubmitMode::Create => "Book added successfully!",
            SubmitMode::Update(_) => "Book updated successfully!",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            SubmitMode::Create => "Failed to add book. Please try again.",
            SubmitMode::Update(_) => "Failed to update book. Please try again.",
        }
    }
}

/// The operation an in-flight request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListBooks,
    LoadForEdit(i64),
    ShowDetail(i64),
    Submit(SubmitMode),
    Delete(i64),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListBooks => "list_books",
            Operation::LoadForEdit(_) => "load_for_edit",
            Operation::ShowDetail(_) => "show_detail",
            Operation::Submit(SubmitMode::Create) => "create_book",
            Operation::Submit(SubmitMode::Update(_)) => "update_book",
            Operation::Delete(_) => "delete_book",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Operation::ListBooks => LIST_FAILED,
            Operation::LoadForEdit(_) | Operation::ShowDetail(_) => LOAD_FAILED,
            Operation::Submit(mode) => mode.failure_message(),
            Operation::Delete(_) => DELETE_FAILED,
        }
    }
}

/// Result of executing an `HttpRequest`: a response of any status, or a
/// transport failure description.
pub type HttpOutcome = Result<HttpResponse, String>;

/// Inputs to the state machine.
///
/// The UI variants deserialize from `{"type": "...", ...}` JSON so a
/// script host can forward them directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The page finished loading.
    Started,
    FieldChanged {
        field: FormField,
        value: String,
    },
    #[serde(skip)]
    ImageSelected {
        image: Option<ImageUpload>,
    },
    Submit,
    CancelEdit,
    EditClicked {
        book_id: i64,
    },
    DeleteClicked {
        book_id: i64,
    },
    /// The user's answer to an `Effect::Confirm`.
    DeleteConfirmed {
        book_id: i64,
        confirmed: bool,
    },
    /// A click on a card outside its action buttons.
    CardClicked {
        book_id: i64,
    },
    CloseModal,
    /// A click on the modal overlay outside its content.
    BackdropClicked,
    #[serde(skip)]
    HttpCompleted {
        request_id: RequestId,
        outcome: HttpOutcome,
    },
    TimerFired {
        timer_id: TimerId,
    },
}

/// Work the host must perform on the app's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Execute the request and report back with `Event::HttpCompleted`.
    Http {
        request_id: RequestId,
        request: HttpRequest,
    },
    /// Ask the user; answer with `Event::DeleteConfirmed`.
    Confirm { book_id: i64, message: String },
    /// Fire `Event::TimerFired` after `delay`.
    StartTimer { timer_id: TimerId, delay: Duration },
    ScrollIntoView { element_id: &'static str },
}

#[derive(Debug, Clone, Copy)]
enum TimerTarget {
    ErrorBanner,
    SuccessBanner(u64),
}

#[derive(Debug)]
pub struct CatalogApp {
    client: BookClient,
    config: ClientConfig,
    form: BookForm,
    loading: bool,
    grid: GridState,
    modal: Option<Book>,
    error_banner: Option<String>,
    success_banners: Vec<Banner>,
    pending: HashMap<RequestId, Operation>,
    timers: HashMap<TimerId, TimerTarget>,
    next_id: u64,
}

impl CatalogApp {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: BookClient::new(&config.base_url),
            config,
            form: BookForm::default(),
            loading: false,
            grid: GridState::Cleared,
            modal: None,
            error_banner: None,
            success_banners: Vec::new(),
            pending: HashMap::new(),
            timers: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn client(&self) -> &BookClient {
        &self.client
    }

    /// Edit mode is exactly "the hidden id field holds a value".
    pub fn is_edit_mode(&self) -> bool {
        self.form.book_id.is_some()
    }

    pub fn form(&self) -> &BookForm {
        &self.form
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn modal(&self) -> Option<&Book> {
        self.modal.as_ref()
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn success_banners(&self) -> &[Banner] {
        &self.success_banners
    }

    /// Operation of an in-flight request, if it is still pending.
    pub fn pending_operation(&self, request_id: RequestId) -> Option<Operation> {
        self.pending.get(&request_id).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn render(&self) -> Node {
        view::page(self)
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Started => self.load_books(),
            Event::FieldChanged { field, value } => {
                match field {
                    FormField::Title => self.form.title = value,
                    FormField::Description => self.form.description = value,
                    FormField::Price => self.form.price = value,
                }
                Vec::new()
            }
            Event::ImageSelected { image } => {
                self.form.image = image;
                Vec::new()
            }
            Event::Submit => self.submit(),
            Event::CancelEdit => {
                self.reset_form();
                Vec::new()
            }
            Event::EditClicked { book_id } => {
                self.modal = None;
                let request = self.client.build_get_book(book_id);
                vec![self.issue(Operation::LoadForEdit(book_id), request)]
            }
            Event::DeleteClicked { book_id } => {
                self.modal = None;
                vec![Effect::Confirm {
                    book_id,
                    message: DELETE_CONFIRMATION.to_string(),
                }]
            }
            Event::DeleteConfirmed { book_id, confirmed } => {
                if !confirmed {
                    debug!(book_id, "delete declined");
                    return Vec::new();
                }
                let request = self.client.build_delete_book(book_id);
                vec![self.issue(Operation::Delete(book_id), request)]
            }
            Event::CardClicked { book_id } => {
                let request = self.client.build_get_book(book_id);
                vec![self.issue(Operation::ShowDetail(book_id), request)]
            }
            Event::CloseModal | Event::BackdropClicked => {
                self.modal = None;
                Vec::new()
            }
            Event::HttpCompleted {
                request_id,
                outcome,
            } => self.complete(request_id, outcome),
            Event::TimerFired { timer_id } => {
                match self.timers.remove(&timer_id) {
                    Some(TimerTarget::ErrorBanner) => self.error_banner = None,
                    Some(TimerTarget::SuccessBanner(id)) => {
                        self.success_banners.retain(|b| b.id != id)
                    }
                    None => warn!(timer_id = timer_id.0, "unknown timer fired"),
                }
                Vec::new()
            }
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn issue(&mut self, operation: Operation, request: HttpRequest) -> Effect {
        let request_id = RequestId(self.next_id());
        debug!(
            request_id = request_id.0,
            operation = operation.name(),
            method = request.method.as_str(),
            path = %request.path,
            "issuing request"
        );
        self.pending.insert(request_id, operation);
        Effect::Http {
            request_id,
            request,
        }
    }

    fn load_books(&mut self) -> Vec<Effect> {
        self.loading = true;
        self.error_banner = None;
        self.grid = GridState::Cleared;
        let request = self.client.build_list_books();
        vec![self.issue(Operation::ListBooks, request)]
    }

    fn submit(&mut self) -> Vec<Effect> {
        let (mode, request) = match self.form.book_id {
            Some(id) => (SubmitMode::Update(id), self.client.build_update_book(id, &self.form)),
            None => (SubmitMode::Create, self.client.build_create_book(&self.form)),
        };
        vec![self.issue(Operation::Submit(mode), request)]
    }

    fn reset_form(&mut self) {
        self.form.clear();
    }

    fn show_error(&mut self, message: &str) -> Effect {
        self.error_banner = Some(message.to_string());
        let timer_id = TimerId(self.next_id());
        self.timers.insert(timer_id, TimerTarget::ErrorBanner);
        Effect::StartTimer {
            timer_id,
            delay: self.config.error_banner_ttl,
        }
    }

    fn show_success(&mut self, message: &str) -> Effect {
        let id = self.next_id();
        self.success_banners.push(Banner {
            id,
            message: message.to_string(),
        });
        let timer_id = TimerId(self.next_id());
        self.timers.insert(timer_id, TimerTarget::SuccessBanner(id));
        Effect::StartTimer {
            timer_id,
            delay: self.config.success_banner_ttl,
        }
    }

    fn complete(&mut self, request_id: RequestId, outcome: HttpOutcome) -> Vec<Effect> {
        let Some(operation) = self.pending.remove(&request_id) else {
            warn!(request_id = request_id.0, "completion for unknown request");
            return Vec::new();
        };
        let response = outcome.map_err(ApiError::Transport);

        match operation {
            Operation::ListBooks => {
                self.loading = false;
                match response.and_then(|r| self.client.parse_list_books(r)) {
                    Ok(books) => {
                        self.grid = GridState::Books(books);
                        Vec::new()
                    }
                    Err(err) => vec![self.fail(operation, err)],
                }
            }
            Operation::LoadForEdit(_) => match response.and_then(|r| self.client.parse_get_book(r)) {
                Ok(book) => {
                    self.form.populate(&book);
                    vec![Effect::ScrollIntoView {
                        element_id: FORM_SECTION_ID,
                    }]
                }
                Err(err) => vec![self.fail(operation, err)],
            },
            Operation::ShowDetail(_) => match response.and_then(|r| self.client.parse_get_book(r)) {
                Ok(book) => {
                    self.modal = Some(book);
                    Vec::new()
                }
                Err(err) => vec![self.fail(operation, err)],
            },
            Operation::Submit(mode) => {
                let parsed = response.and_then(|r| match mode {
                    SubmitMode::Create => self.client.parse_create_book(r),
                    SubmitMode::Update(_) => self.client.parse_update_book(r),
                });
                match parsed {
                    Ok(_) => {
                        let mut effects = vec![self.show_success(mode.success_message())];
                        self.reset_form();
                        effects.extend(self.load_books());
                        effects
                    }
                    Err(err) => vec![self.fail(operation, err)],
                }
            }
            Operation::Delete(_) => match response.and_then(|r| self.client.parse_delete_book(r)) {
                Ok(()) => {
                    let mut effects = vec![self.show_success(DELETE_SUCCEEDED)];
                    effects.extend(self.load_books());
                    effects
                }
                Err(err) => vec![self.fail(operation, err)],
            },
        }
    }

    fn fail(&mut self, operation: Operation, err: ApiError) -> Effect {
        error!(
            operation = operation.name(),
            error = %err,
            "request failed"
        );
        self.show_error(operation.failure_message())
    }
}
