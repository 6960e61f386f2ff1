//! A pending API operation.

use std::future::IntoFuture;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use mite_client::{
    Completion, MiteClient, Params, Request, RequestBody, RequestMethod, RequestOptions, Response,
};

use crate::error::Result;

/// One operation on the mite API, not yet sent.
///
/// Attach callbacks or a timeout, then either `.await` it (non-blocking,
/// callbacks fire) or call [`ApiCall::send_blocking`] (blocks, no callbacks).
///
/// # Example
///
/// ```rust,ignore
/// let response = mite
///     .customers()
///     .find(42)
///     .on_success(|customer| println!("{customer}"))
///     .timeout(Duration::from_secs(5))
///     .await?;
/// ```
#[must_use = "an ApiCall does nothing until awaited or sent"]
#[derive(Debug)]
pub struct ApiCall {
    client: MiteClient,
    method: RequestMethod,
    resource_path: String,
    params: Params,
    body: Value,
    options: RequestOptions,
    use_cache: bool,
}

impl ApiCall {
    pub(crate) fn get(
        client: MiteClient,
        resource_path: impl Into<String>,
        params: Params,
        use_cache: bool,
    ) -> Self {
        Self {
            client,
            method: RequestMethod::Get,
            resource_path: resource_path.into(),
            params,
            body: Value::Null,
            options: RequestOptions::new(),
            use_cache,
        }
    }

    pub(crate) fn write(
        client: MiteClient,
        method: RequestMethod,
        resource_path: impl Into<String>,
        body: Value,
    ) -> Self {
        Self {
            client,
            method,
            resource_path: resource_path.into(),
            params: Params::None,
            body,
            options: RequestOptions::new(),
            use_cache: false,
        }
    }

    /// Called with the parsed payload on success.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        self.options = self.options.on_success(f);
        self
    }

    /// Called with the completion handle and message on error or timeout.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Completion, &str) + Send + 'static,
    {
        self.options = self.options.on_error(f);
        self
    }

    /// Called with the completion handle once the response is in.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Completion) + Send + 'static,
    {
        self.options = self.options.on_complete(f);
        self
    }

    /// Override the configured timeout window.
    ///
    /// Takes effect together with [`ApiCall::on_error`], and bounds a blocking send.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.timeout(timeout);
        self
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// The full URL this call will hit.
    pub fn url(&self) -> String {
        self.client.url_for(&self.resource_path, &self.params)
    }

    /// Send without blocking and wait for the normalized response.
    #[instrument(skip(self), fields(method = %self.method, resource = %self.resource_path))]
    pub async fn send(self) -> Result<Response> {
        let Self {
            client,
            method,
            resource_path,
            params,
            body,
            options,
            use_cache,
        } = self;

        let response = match method {
            RequestMethod::Get => {
                client
                    .get(&resource_path, params, options, use_cache)
                    .await?
            }
            RequestMethod::Post => client.post(&resource_path, body, options).await?,
            RequestMethod::Put => client.put(&resource_path, body, options).await?,
            RequestMethod::Delete => client.delete(&resource_path, options).await?,
        };
        Ok(response)
    }

    /// Send and deserialize the success payload.
    pub async fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.send().await?;
        response.decode().map_err(Into::into)
    }

    /// Send, blocking the calling thread, and return the parsed body.
    ///
    /// Callbacks are not invoked; the registry and the cache are bypassed.
    /// Must not be called from inside an async runtime.
    pub fn send_blocking(self) -> Result<Value> {
        let url = self.url();
        let timeout = self.options.timeout_override();
        let request = Request::new(self.method, url).with_body(RequestBody::from_value(self.body));
        self.client
            .send_blocking(&request, timeout)
            .map_err(Into::into)
    }
}

impl IntoFuture for ApiCall {
    type Output = Result<Response>;
    type IntoFuture = BoxFuture<'static, Result<Response>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.send())
    }
}
