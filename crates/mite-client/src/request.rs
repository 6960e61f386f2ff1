//! Request descriptors and per-call options.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::response::Completion;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body content.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured body, sent JSON-encoded with `Content-Type: application/json`.
    Json(Value),
    /// Text body, sent as-is.
    Text(String),
}

impl RequestBody {
    /// Classify a JSON value: strings travel as text, `null` means no body.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(RequestBody::Text(text)),
            other => Some(RequestBody::Json(other)),
        }
    }
}

/// Called with the parsed payload of a successful response.
pub type SuccessCallback = Box<dyn FnOnce(&Value) + Send>;
/// Called with the completion handle and the error message.
pub type ErrorCallback = Box<dyn FnOnce(&Completion, &str) + Send>;
/// Called with the completion handle once the outcome is known.
pub type CompleteCallback = Box<dyn FnOnce(&Completion) + Send>;

/// The three optional notification hooks of a request.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) on_success: Option<SuccessCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) on_complete: Option<CompleteCallback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Per-call options: callbacks and a timeout override.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub(crate) callbacks: Callbacks,
    pub(crate) timeout: Option<Duration>,
}

impl RequestOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a success callback.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        self.callbacks.on_success = Some(Box::new(f));
        self
    }

    /// Register an error callback.
    ///
    /// Replaces the configured default handler for this call and also
    /// receives the `timeout` notification.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Completion, &str) + Send + 'static,
    {
        self.callbacks.on_error = Some(Box::new(f));
        self
    }

    /// Register a completion callback.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Completion) + Send + 'static,
    {
        self.callbacks.on_complete = Some(Box::new(f));
        self
    }

    /// Override the configured timeout window.
    ///
    /// The alarm only runs for calls with an error callback; without one the
    /// call waits for the real response.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The timeout override, if one was set.
    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns true if an explicit error callback was supplied.
    pub fn has_error_callback(&self) -> bool {
        self.callbacks.on_error.is_some()
    }
}

/// A fully built request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: RequestMethod,
    pub url: String,
    pub body: Option<RequestBody>,
}

impl Request {
    /// Create a request without a body.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    /// Attach a body.
    pub fn with_body(mut self, body: Option<RequestBody>) -> Self {
        self.body = body;
        self
    }
}
