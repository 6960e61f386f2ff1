//! Normalized responses and callback dispatch.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ErrorHandler;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{Callbacks, RequestMethod};

/// Message used when an error outcome carries no body.
pub const ERROR_MESSAGE: &str = "error";

/// Message delivered by the timeout alarm.
pub const TIMEOUT_MESSAGE: &str = "timeout";

/// Raw transport handle of a finished exchange.
///
/// `status` is 0 when no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub method: RequestMethod,
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl Completion {
    /// Create a completion from a received response.
    pub fn new(method: RequestMethod, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// A completion for an exchange that never produced a response.
    pub fn unsent(method: RequestMethod, url: impl Into<String>) -> Self {
        Self::new(method, url, 0, String::new())
    }

    /// Returns true if the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Exactly one of success payload or error message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Error(String),
}

/// A normalized response: the outcome plus the completion handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub outcome: Outcome,
    pub completion: Completion,
}

impl Response {
    /// Classify a finished exchange.
    ///
    /// Success requires a 2xx status and a non-empty body. A 2xx body that is
    /// not JSON fails with `ErrorKind::Json`.
    pub fn normalize(completion: Completion) -> Result<Self> {
        let outcome = if completion.is_success() {
            if completion.body.is_empty() {
                Outcome::Error(ERROR_MESSAGE.to_string())
            } else {
                Outcome::Success(parse_json_body(&completion.body)?)
            }
        } else if completion.body.is_empty() {
            Outcome::Error(ERROR_MESSAGE.to_string())
        } else {
            Outcome::Error(completion.body.clone())
        };

        Ok(Self {
            outcome,
            completion,
        })
    }

    /// The response handed out when the timeout alarm fires first.
    pub fn timed_out(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Error(TIMEOUT_MESSAGE.to_string()),
            completion: Completion::unsent(method, url),
        }
    }

    /// Returns true for a success outcome.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// The success payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// The error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Error(message) => Some(message),
        }
    }

    /// Take the success payload, turning an error outcome into an `Error`.
    pub fn into_payload(self) -> Result<Value> {
        match self.outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Error(message) if self.completion.status == 0 => {
                if message == TIMEOUT_MESSAGE {
                    Err(Error::new(ErrorKind::Timeout))
                } else {
                    Err(Error::new(ErrorKind::Connection(format!(
                        "no response from {}",
                        self.completion.url
                    ))))
                }
            }
            Outcome::Error(message) => Err(Error::new(ErrorKind::Http {
                status: self.completion.status,
                message,
            })),
        }
    }

    /// Deserialize the success payload.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.into_payload()?;
        Ok(serde_json::from_value(value)?)
    }

    /// Notify a waiter of a fresh outcome.
    ///
    /// Error outcomes without an error callback go to `fallback`.
    pub(crate) fn deliver(&self, callbacks: Callbacks, fallback: &ErrorHandler) {
        let Callbacks {
            on_success,
            on_error,
            on_complete,
        } = callbacks;

        match &self.outcome {
            Outcome::Success(value) => {
                if let Some(on_success) = on_success {
                    on_success(value);
                }
            }
            Outcome::Error(message) => match on_error {
                Some(on_error) => on_error(&self.completion, message),
                None => fallback(&self.completion, message),
            },
        }

        if let Some(on_complete) = on_complete {
            on_complete(&self.completion);
        }
    }

    /// Replay a cached outcome. Only callbacks that were supplied run.
    pub(crate) fn replay(&self, callbacks: Callbacks) {
        let Callbacks {
            on_success,
            on_error,
            on_complete,
        } = callbacks;

        match (&self.outcome, on_success, on_error) {
            (Outcome::Success(value), Some(on_success), _) => on_success(value),
            (Outcome::Error(message), _, Some(on_error)) => on_error(&self.completion, message),
            _ => {}
        }

        if let Some(on_complete) = on_complete {
            on_complete(&self.completion);
        }
    }

    /// Notify a waiter that the timeout alarm fired.
    pub(crate) fn deliver_timeout(&self, callbacks: Callbacks) {
        if let Some(on_error) = callbacks.on_error {
            on_error(&self.completion, TIMEOUT_MESSAGE);
        }
    }
}

/// Parse a body as JSON; a blank body yields an empty object.
pub fn parse_json_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    Ok(serde_json::from_str(body)?)
}
