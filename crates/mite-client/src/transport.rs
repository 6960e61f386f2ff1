//! HTTP transport: one exchange per call, with the mite headers attached.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info, instrument, warn};

use crate::config::MiteConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{Request, RequestBody};
use crate::response::Completion;

const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
const API_KEY_HEADER: &str = "X-MiteApiKey";
const ACCOUNT_HEADER: &str = "X-MiteAccount";

/// Sends requests to the mite API.
///
/// Holds an async client for the non-blocking path and lazily builds a
/// blocking client the first time a blocking call is made.
#[derive(Debug)]
pub struct Transport {
    inner: reqwest::Client,
    blocking: OnceLock<reqwest::blocking::Client>,
    headers: HeaderMap,
    user_agent: String,
}

impl Transport {
    /// Create a transport for the given account.
    pub fn new(config: &MiteConfig) -> Result<Self> {
        let headers = api_headers(config)?;

        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .default_headers(headers.clone())
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            inner,
            blocking: OnceLock::new(),
            headers,
            user_agent: config.user_agent().to_string(),
        })
    }

    /// Perform one exchange without blocking.
    ///
    /// Never fails: a transport-level failure is reported as an unsent
    /// completion (status 0, empty body).
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: &Request) -> Completion {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        if let Some(ref body) = request.body {
            req = match body {
                RequestBody::Json(value) => req.json(value),
                RequestBody::Text(text) => req.body(text.clone()),
            };
        }

        debug!("Sending request");

        let response = match req.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Request failed");
                return Completion::unsent(request.method, request.url.clone());
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(status, error = %err, "Failed to read response body");
                String::new()
            }
        };

        if (200..300).contains(&status) {
            debug!(status, content_length = body.len(), "Response received");
        } else {
            info!(status, content_length = body.len(), "Non-success response");
        }

        Completion::new(request.method, request.url.clone(), status, body)
    }

    /// Perform one exchange, blocking the calling thread.
    ///
    /// Must not be called from inside an async runtime.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub fn send_blocking(&self, request: &Request, timeout: Duration) -> Result<Completion> {
        let mut req = self
            .blocking_client()?
            .request(request.method.to_reqwest(), &request.url)
            .timeout(timeout);

        if let Some(ref body) = request.body {
            req = match body {
                RequestBody::Json(value) => req.json(value),
                RequestBody::Text(text) => req.body(text.clone()),
            };
        }

        debug!("Sending blocking request");

        let response = req.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        debug!(status, content_length = body.len(), "Response received");

        Ok(Completion::new(
            request.method,
            request.url.clone(),
            status,
            body,
        ))
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(self.headers.clone())
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(self.blocking.get_or_init(|| client))
    }
}

/// The three headers attached to every request.
fn api_headers(config: &MiteConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        REQUESTED_WITH_HEADER,
        HeaderValue::from_static("XMLHttpRequest"),
    );

    let mut api_key = header_value("API key", config.api_key())?;
    api_key.set_sensitive(true);
    headers.insert(API_KEY_HEADER, api_key);
    headers.insert(ACCOUNT_HEADER, header_value("account", config.account())?);

    Ok(headers)
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        Error::with_source(
            ErrorKind::Config(format!("{what} is not a valid header value")),
            e,
        )
    })
}
