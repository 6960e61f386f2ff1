//! The shared mite client: coalesced reads, cached responses, writes.
//!
//! ## Read path
//!
//! Concurrent GETs for the same URL share one exchange. The first caller
//! registers itself and spawns the exchange; later callers queue behind it.
//! When the response lands every queued caller is notified in queue order,
//! the normalized response is cached under the URL and the registry entry is
//! removed.
//!
//! ## Timeouts
//!
//! A caller that supplied an error callback gets its own alarm. When it fires
//! first, that caller alone receives `timeout` and leaves the queue. The
//! exchange keeps running and the registry entry stays until it lands, so the
//! URL is never fetched twice at once. Callers without an error callback wait
//! for the real response.
//!
//! ## Security
//!
//! The API key is redacted in Debug output and never recorded in spans.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, instrument, warn};

use crate::config::MiteConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::query::{append_query, build_query, build_url, Params};
use crate::registry::{InFlightRegistry, ResponseCache, Waiter};
use crate::request::{Request, RequestBody, RequestMethod, RequestOptions};
use crate::response::{parse_json_body, Completion, Response};
use crate::transport::Transport;

/// Client for one mite account.
///
/// Cheap to clone; clones share the in-flight registry and the cache.
///
/// # Example
///
/// ```rust,ignore
/// use mite_client::{MiteClient, MiteConfig, Params, RequestOptions};
///
/// let client = MiteClient::new(MiteConfig::from_env()?)?;
///
/// let response = client
///     .get("time_entries", Params::pair("year", 2024), RequestOptions::new(), false)
///     .await?;
/// ```
#[derive(Clone)]
pub struct MiteClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiteClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

struct Inner {
    config: MiteConfig,
    transport: Transport,
    in_flight: Mutex<InFlightRegistry>,
    cache: Mutex<ResponseCache>,
    next_waiter: AtomicU64,
}

/// A write caller, shared by the exchange and the caller's alarm.
type Slot = Arc<Mutex<Option<Waiter>>>;

/// Who gets notified when an exchange finishes.
enum Audience {
    /// Everyone still queued in the registry under the request URL.
    Coalesced { resource_path: String },
    /// A single write caller.
    Single(Slot),
}

/// Where an alarm looks for its caller.
enum Target {
    Queued(u64),
    Single(Slot),
}

enum Admission {
    Cached(Response, Waiter),
    Lead,
    Queued(usize),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MiteClient {
    /// Create a client for the configured account.
    pub fn new(config: MiteConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                transport,
                in_flight: Mutex::new(InFlightRegistry::default()),
                cache: Mutex::new(ResponseCache::default()),
                next_waiter: AtomicU64::new(0),
            }),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &MiteConfig {
        &self.inner.config
    }

    /// Build the full URL for a resource path and query parameters.
    ///
    /// Example: `url_for("time_entries", &Params::pair("year", 2024))` ->
    /// `https://corsapi.mite.yo.lk/time_entries.json?year=2024`
    pub fn url_for(&self, resource_path: &str, params: &Params) -> String {
        let url = build_url(&self.inner.config.api_root(), resource_path);
        append_query(&url, &build_query(params))
    }

    /// Read a resource.
    ///
    /// Joins an identical in-flight GET instead of issuing a new one. With
    /// `use_cache`, a cached response is replayed into the callbacks and
    /// returned without any network traffic, unless the URL is in flight.
    #[instrument(skip(self, params, options), fields(resource = resource_path))]
    pub async fn get(
        &self,
        resource_path: &str,
        params: impl Into<Params>,
        options: RequestOptions,
        use_cache: bool,
    ) -> Result<Response> {
        let url = self.url_for(resource_path, &params.into());
        let (reply, rx) = oneshot::channel();
        let mut waiter = Waiter::new(self.inner.next_id(), options, reply);

        let admission = {
            let mut in_flight = lock(&self.inner.in_flight);
            let cached = if use_cache && !in_flight.contains(&url) {
                lock(&self.inner.cache).get(&url).cloned()
            } else {
                None
            };

            if let Some(response) = cached {
                Admission::Cached(response, waiter)
            } else {
                // The registry lock is held, so the alarm cannot fire before
                // the caller is queued.
                waiter.alarm = self.inner.arm(
                    &waiter.options,
                    RequestMethod::Get,
                    &url,
                    Target::Queued(waiter.id),
                );
                if in_flight.enqueue(&url, waiter) {
                    Admission::Lead
                } else {
                    Admission::Queued(in_flight.waiting(&url))
                }
            }
        };

        match admission {
            Admission::Cached(response, waiter) => {
                debug!(url = %url, "Serving from cache");
                response.replay(waiter.options.callbacks);
                return Ok(response);
            }
            Admission::Lead => {
                let request = Request::new(RequestMethod::Get, url);
                let audience = Audience::Coalesced {
                    resource_path: resource_path.to_string(),
                };
                tokio::spawn(self.inner.clone().exchange(request, audience));
            }
            Admission::Queued(position) => {
                debug!(url = %url, position, "Joining in-flight request");
            }
        }

        await_reply(rx).await
    }

    /// Create a resource.
    pub async fn post(
        &self,
        resource_path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<Response> {
        self.write(
            RequestMethod::Post,
            resource_path,
            RequestBody::from_value(body),
            options,
        )
        .await
    }

    /// Update a resource.
    pub async fn put(
        &self,
        resource_path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<Response> {
        self.write(
            RequestMethod::Put,
            resource_path,
            RequestBody::from_value(body),
            options,
        )
        .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_path: &str, options: RequestOptions) -> Result<Response> {
        self.write(RequestMethod::Delete, resource_path, None, options)
            .await
    }

    /// Issue a write. Writes are never coalesced and never cached.
    #[instrument(skip(self, body, options), fields(method = %method, resource = resource_path))]
    async fn write(
        &self,
        method: RequestMethod,
        resource_path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<Response> {
        let url = self.url_for(resource_path, &Params::None);
        let (reply, rx) = oneshot::channel();
        let mut waiter = Waiter::new(self.inner.next_id(), options, reply);

        let slot: Slot = Arc::new(Mutex::new(None));
        {
            let mut pending = lock(&slot);
            waiter.alarm = self.inner.arm(
                &waiter.options,
                method,
                &url,
                Target::Single(slot.clone()),
            );
            *pending = Some(waiter);
        }

        let request = Request::new(method, url).with_body(body);
        tokio::spawn(
            self.inner
                .clone()
                .exchange(request, Audience::Single(slot)),
        );

        await_reply(rx).await
    }

    /// Read a resource, blocking the calling thread.
    ///
    /// Bypasses the registry and the cache.
    pub fn get_blocking(&self, resource_path: &str, params: impl Into<Params>) -> Result<Value> {
        let url = self.url_for(resource_path, &params.into());
        self.send_blocking(&Request::new(RequestMethod::Get, url), None)
    }

    /// Create a resource, blocking the calling thread.
    pub fn post_blocking(&self, resource_path: &str, body: Value) -> Result<Value> {
        let url = self.url_for(resource_path, &Params::None);
        let request =
            Request::new(RequestMethod::Post, url).with_body(RequestBody::from_value(body));
        self.send_blocking(&request, None)
    }

    /// Update a resource, blocking the calling thread.
    pub fn put_blocking(&self, resource_path: &str, body: Value) -> Result<Value> {
        let url = self.url_for(resource_path, &Params::None);
        let request =
            Request::new(RequestMethod::Put, url).with_body(RequestBody::from_value(body));
        self.send_blocking(&request, None)
    }

    /// Delete a resource, blocking the calling thread.
    pub fn delete_blocking(&self, resource_path: &str) -> Result<Value> {
        let url = self.url_for(resource_path, &Params::None);
        self.send_blocking(&Request::new(RequestMethod::Delete, url), None)
    }

    /// Send a request, blocking the calling thread, and parse the body.
    ///
    /// The body is parsed whatever the status; a blank body yields `{}`.
    /// No callbacks are involved.
    pub fn send_blocking(&self, request: &Request, timeout: Option<Duration>) -> Result<Value> {
        let timeout = timeout.unwrap_or(self.inner.config.timeout());
        let completion = self.inner.transport.send_blocking(request, timeout)?;
        parse_json_body(&completion.body)
    }

    /// Drop cached responses: all of them, or those built from `resource_path`.
    pub fn clear_cache(&self, resource_path: Option<&str>) {
        debug!(resource = resource_path, "Clearing cache");
        lock(&self.inner.cache).clear(resource_path);
    }

    /// Number of cached URLs.
    pub fn cached_count(&self) -> usize {
        lock(&self.inner.cache).len()
    }

    /// Number of URLs with a GET in flight.
    pub fn in_flight_count(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }
}

async fn await_reply(rx: oneshot::Receiver<Result<Response>>) -> Result<Response> {
    rx.await.map_err(|_| {
        Error::new(ErrorKind::Other(
            "request task ended without a reply".to_string(),
        ))
    })?
}

impl Inner {
    fn next_id(&self) -> u64 {
        self.next_waiter.fetch_add(1, Ordering::Relaxed)
    }

    /// Start the timeout alarm for a caller with an error callback.
    fn arm(
        self: &Arc<Self>,
        options: &RequestOptions,
        method: RequestMethod,
        url: &str,
        target: Target,
    ) -> Option<AbortHandle> {
        if !options.has_error_callback() {
            return None;
        }

        let window = options.timeout_override().unwrap_or(self.config.timeout());
        let alarm = self.clone().alarm(method, url.to_string(), target, window);
        Some(tokio::spawn(alarm).abort_handle())
    }

    async fn alarm(
        self: Arc<Self>,
        method: RequestMethod,
        url: String,
        target: Target,
        window: Duration,
    ) {
        tokio::time::sleep(window).await;

        let waiter = match target {
            Target::Queued(id) => lock(&self.in_flight).remove(&url, id),
            Target::Single(slot) => lock(&slot).take(),
        };
        // Already answered by the exchange.
        let Some(waiter) = waiter else { return };

        warn!(
            method = %method,
            url = %url,
            timeout_ms = window.as_millis() as u64,
            "Request timed out"
        );

        let response = Response::timed_out(method, url);
        response.deliver_timeout(waiter.options.callbacks);
        // The caller may have stopped waiting.
        let _ = waiter.reply.send(Ok(response));
    }

    /// Run one exchange to completion and notify the audience.
    async fn exchange(self: Arc<Self>, request: Request, audience: Audience) {
        let completion = self.transport.send(&request).await;
        self.settle(completion, audience);
    }

    fn settle(&self, completion: Completion, audience: Audience) {
        let url = completion.url.clone();
        let normalized = Response::normalize(completion);

        if let Err(ref err) = normalized {
            warn!(url = %url, error = %err, "Malformed response body");
        }

        match audience {
            Audience::Single(slot) => {
                let waiter = lock(&slot).take();
                match waiter {
                    Some(waiter) => self.notify(waiter, &normalized),
                    None => debug!(url = %url, "Discarding response after timeout"),
                }
            }
            Audience::Coalesced { resource_path } => {
                let waiters = {
                    let mut in_flight = lock(&self.in_flight);
                    if let Ok(ref response) = normalized {
                        lock(&self.cache).insert(url.clone(), &resource_path, response.clone());
                    }
                    in_flight.take(&url)
                };

                debug!(url = %url, waiters = waiters.len(), "Delivering response");
                for waiter in waiters {
                    self.notify(waiter, &normalized);
                }
            }
        }
    }

    fn notify(&self, mut waiter: Waiter, normalized: &Result<Response>) {
        waiter.disarm();

        let reply = match normalized {
            Ok(response) => {
                response.deliver(waiter.options.callbacks, self.config.error_handler());
                Ok(response.clone())
            }
            Err(err) => Err(Error::new(ErrorKind::Json(match &err.kind {
                ErrorKind::Json(message) => message.clone(),
                other => other.to_string(),
            }))),
        };
        let _ = waiter.reply.send(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MiteClient {
        MiteClient::new(
            MiteConfig::builder()
                .with_account("acme")
                .with_api_key("k")
                .with_base_url(server.uri())
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (count.clone(), count)
    }

    #[tokio::test]
    async fn test_url_for() {
        let client = MiteClient::new(
            MiteConfig::builder()
                .with_account("acme")
                .with_api_key("k")
                .build()
                .unwrap(),
        )
        .unwrap();

        assert_eq!(
            client.url_for("time_entries", &Params::None),
            "https://corsapi.mite.yo.lk/time_entries.json"
        );
        assert_eq!(
            client.url_for("time_entries", &Params::pair("year", 2014)),
            "https://corsapi.mite.yo.lk/time_entries.json?year=2014"
        );
        assert_eq!(
            client.url_for("projects?customer_id=1,2", &Params::pair("limit", 5)),
            "https://corsapi.mite.yo.lk/projects.json?customer_id=1,2&limit=5"
        );
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customers.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"customer": {"id": 1}}]))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let order = Arc::new(Mutex::new(Vec::new()));

        let calls = (1..=3).map(|n| {
            let order = order.clone();
            let options = RequestOptions::new().on_success(move |_| order.lock().unwrap().push(n));
            client.get("customers", Params::None, options, false)
        });
        let results = futures::future::join_all(calls).await;

        for result in results {
            let response = result.unwrap();
            assert_eq!(response.payload(), Some(&json!([{"customer": {"id": 1}}])));
        }
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(client.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_different_params_are_separate_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/time_entries.json"))
            .and(query_param("year", "2013"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/time_entries.json"))
            .and(query_param("year", "2014"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (a, b) = tokio::join!(
            client.get("time_entries", Params::pair("year", 2013), RequestOptions::new(), false),
            client.get("time_entries", Params::pair("year", 2014), RequestOptions::new(), false),
        );
        assert!(a.unwrap().is_success());
        assert!(b.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_cache_hit_and_clear() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"project": {}}])))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        let first = client
            .get("projects", Params::None, RequestOptions::new(), true)
            .await
            .unwrap();
        assert_eq!(client.cached_count(), 1);

        let (successes, seen) = counter();
        let (completes, seen_complete) = counter();
        let options = RequestOptions::new()
            .on_success(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move |c| {
                assert_eq!(c.status, 200);
                seen_complete.fetch_add(1, Ordering::SeqCst);
            });
        let second = client
            .get("projects", Params::None, options, true)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 1);

        client.clear_cache(None);
        assert_eq!(client.cached_count(), 0);

        client
            .get("projects", Params::None, RequestOptions::new(), true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_plain_reads_skip_cache_but_fill_it() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        for _ in 0..2 {
            client
                .get("users", Params::None, RequestOptions::new(), false)
                .await
                .unwrap();
        }
        assert_eq!(client.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_by_resource_path() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        for resource in ["customers", "customers/5", "services"] {
            client
                .get(resource, Params::None, RequestOptions::new(), true)
                .await
                .unwrap();
        }
        assert_eq!(client.cached_count(), 3);

        client.clear_cache(Some("customers"));
        assert_eq!(client.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_posts_are_not_coalesced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/time_entries.json"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"time_entry": {"id": 1}}))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let body = json!({"time_entry": {"minutes": 30}});
        let (a, b) = tokio::join!(
            client.post("time_entries", body.clone(), RequestOptions::new()),
            client.post("time_entries", body.clone(), RequestOptions::new()),
        );

        assert!(a.unwrap().is_success());
        assert!(b.unwrap().is_success());
        assert_eq!(client.cached_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_delivers_one_outcome() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tracker.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"tracker": {}}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (errors, seen_error) = counter();
        let (completes, seen_complete) = counter();
        let (successes, seen_success) = counter();

        let options = RequestOptions::new()
            .timeout(Duration::from_millis(50))
            .on_error(move |c, message| {
                assert_eq!(message, "timeout");
                assert_eq!(c.status, 0);
                seen_error.fetch_add(1, Ordering::SeqCst);
            })
            .on_success(move |_| {
                seen_success.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move |_| {
                seen_complete.fetch_add(1, Ordering::SeqCst);
            });

        let response = client
            .get("tracker", Params::None, options, false)
            .await
            .unwrap();
        assert_eq!(response.error_message(), Some("timeout"));
        assert!(response.into_payload().unwrap_err().is_timeout());
        // the exchange is still outstanding
        assert_eq!(client.in_flight_count(), 1);

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(completes.load(Ordering::SeqCst), 0);
        assert_eq!(client.in_flight_count(), 0);
        assert_eq!(client.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_without_error_callback_waits_for_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"project": {"id": 1}}]))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (successes, seen_success) = counter();
        let (completes, seen_complete) = counter();
        let options = RequestOptions::new()
            .timeout(Duration::from_millis(50))
            .on_success(move |_| {
                seen_success.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move |_| {
                seen_complete.fetch_add(1, Ordering::SeqCst);
            });

        let response = client
            .get("projects", Params::None, options, false)
            .await
            .unwrap();

        assert_eq!(response.payload(), Some(&json!([{"project": {"id": 1}}])));
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
        assert_eq!(client.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_timed_out_url_is_not_fetched_twice() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"user": {"id": 3}}]))
                    .set_delay(Duration::from_millis(400)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        let first = client
            .get(
                "users",
                Params::None,
                RequestOptions::new()
                    .timeout(Duration::from_millis(50))
                    .on_error(|_, _| {}),
                false,
            )
            .await
            .unwrap();
        assert_eq!(first.error_message(), Some("timeout"));

        let (successes, seen_success) = counter();
        let second = client
            .get(
                "users",
                Params::None,
                RequestOptions::new()
                    .timeout(Duration::from_millis(50))
                    .on_success(move |_| {
                        seen_success.fetch_add(1, Ordering::SeqCst);
                    }),
                false,
            )
            .await
            .unwrap();

        assert_eq!(second.payload(), Some(&json!([{"user": {"id": 3}}])));
        assert_eq!(successes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_queued_caller_gets_its_own_alarm() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (errors, seen_error) = counter();

        let (lead, queued) = tokio::join!(
            client.get("services", Params::None, RequestOptions::new(), false),
            client.get(
                "services",
                Params::None,
                RequestOptions::new()
                    .timeout(Duration::from_millis(50))
                    .on_error(move |_, message| {
                        assert_eq!(message, "timeout");
                        seen_error.fetch_add(1, Ordering::SeqCst);
                    }),
                false,
            ),
        );

        assert!(lead.unwrap().is_success());
        assert_eq!(queued.unwrap().error_message(), Some("timeout"));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_url_in_flight_joins_queue() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["old"])))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/customers.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(["new"]))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client
            .get("customers", Params::None, RequestOptions::new(), true)
            .await
            .unwrap();
        assert_eq!(client.cached_count(), 1);

        let (plain, cached) = tokio::join!(
            client.get("customers", Params::None, RequestOptions::new(), false),
            client.get("customers", Params::None, RequestOptions::new(), true),
        );

        assert_eq!(plain.unwrap().payload(), Some(&json!(["new"])));
        assert_eq!(cached.unwrap().payload(), Some(&json!(["new"])));
    }

    #[tokio::test]
    async fn test_write_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/time_entries.json"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"time_entry": {"id": 1}}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let body = json!({"time_entry": {"minutes": 30}});
        let (errors, seen_error) = counter();
        let (completes, seen_complete) = counter();

        let (timed_out, waited) = tokio::join!(
            client.post(
                "time_entries",
                body.clone(),
                RequestOptions::new()
                    .timeout(Duration::from_millis(50))
                    .on_error(move |_, message| {
                        assert_eq!(message, "timeout");
                        seen_error.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_complete(move |_| {
                        seen_complete.fetch_add(1, Ordering::SeqCst);
                    }),
            ),
            client.post(
                "time_entries",
                body.clone(),
                RequestOptions::new().timeout(Duration::from_millis(50)),
            ),
        );

        assert!(timed_out.unwrap().into_payload().unwrap_err().is_timeout());
        assert!(waited.unwrap().is_success());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/account.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (successes, seen) = counter();
        let options = RequestOptions::new().on_success(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let err = client
            .get("account", Params::None, options, true)
            .await
            .unwrap_err();

        assert!(err.is_json());
        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(client.cached_count(), 0);
    }

    #[tokio::test]
    async fn test_error_outcome_uses_default_handler() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/tracker/7.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&mock_server)
            .await;

        let (handled, seen) = counter();
        let client = MiteClient::new(
            MiteConfig::builder()
                .with_account("acme")
                .with_api_key("k")
                .with_base_url(mock_server.uri())
                .with_error_handler(move |c, message| {
                    assert_eq!(c.status, 500);
                    assert_eq!(message, "oops");
                    seen.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .unwrap(),
        )
        .unwrap();

        let response = client
            .delete("tracker/7", RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(response.error_message(), Some("oops"));
        assert_eq!(response.completion.status, 500);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_callback_replaces_default_handler() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/myself.json"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let (handled, seen_default) = counter();
        let (errors, seen_error) = counter();
        let client = MiteClient::new(
            MiteConfig::builder()
                .with_account("acme")
                .with_api_key("k")
                .with_base_url(mock_server.uri())
                .with_error_handler(move |_, _| {
                    seen_default.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .unwrap(),
        )
        .unwrap();

        let options = RequestOptions::new().on_error(move |_, message| {
            assert_eq!(message, "error");
            seen_error.fetch_add(1, Ordering::SeqCst);
        });
        let response = client
            .get("myself", Params::None, options, false)
            .await
            .unwrap();

        assert_eq!(response.error_message(), Some("error"));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_calls() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/account.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"account": {"name": "acme"}})))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/tracker/7.json"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let (account, tracker) = tokio::task::spawn_blocking(move || {
            let account = client.get_blocking("account", Params::None);
            let tracker = client.put_blocking("tracker/7", json!({}));
            (account, tracker)
        })
        .await
        .unwrap();

        assert_eq!(account.unwrap(), json!({"account": {"name": "acme"}}));
        assert_eq!(tracker.unwrap(), json!({}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_transport_error_propagates() {
        let client = MiteClient::new(
            MiteConfig::builder()
                .with_account("acme")
                .with_api_key("k")
                .with_base_url("http://127.0.0.1:9")
                .build()
                .unwrap(),
        )
        .unwrap();

        let result = tokio::task::spawn_blocking(move || client.get_blocking("account", ()))
            .await
            .unwrap();
        assert!(result.is_err());
    }
}
