//! In-flight GET registry and response cache.
//!
//! Both maps are keyed by the fully built request URL and are independent of
//! each other: an entry in one says nothing about the other.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::error::Result;
use crate::request::RequestOptions;
use crate::response::Response;

/// A caller waiting for an exchange to finish.
#[derive(Debug)]
pub(crate) struct Waiter {
    pub(crate) id: u64,
    pub(crate) options: RequestOptions,
    pub(crate) reply: oneshot::Sender<Result<Response>>,
    /// Timeout alarm, armed only when the caller supplied an error callback.
    pub(crate) alarm: Option<AbortHandle>,
}

impl Waiter {
    pub(crate) fn new(
        id: u64,
        options: RequestOptions,
        reply: oneshot::Sender<Result<Response>>,
    ) -> Self {
        Self {
            id,
            options,
            reply,
            alarm: None,
        }
    }

    /// Stop the timeout alarm, if one is armed.
    pub(crate) fn disarm(&mut self) {
        if let Some(alarm) = self.alarm.take() {
            alarm.abort();
        }
    }
}

/// GET requests currently awaiting a response, with their queued callers.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: HashMap<String, Vec<Waiter>>,
}

impl InFlightRegistry {
    /// Returns true if a request for `url` is awaiting its response.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Number of callers queued on `url`.
    pub fn waiting(&self, url: &str) -> usize {
        self.entries.get(url).map_or(0, Vec::len)
    }

    /// Number of URLs in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue a caller. Returns true when it is the first for this URL and
    /// therefore has to issue the request.
    pub(crate) fn enqueue(&mut self, url: &str, waiter: Waiter) -> bool {
        match self.entries.get_mut(url) {
            Some(waiters) => {
                waiters.push(waiter);
                false
            }
            None => {
                self.entries.insert(url.to_string(), vec![waiter]);
                true
            }
        }
    }

    /// Remove the entry for `url`, returning its callers in queue order.
    pub(crate) fn take(&mut self, url: &str) -> Vec<Waiter> {
        self.entries.remove(url).unwrap_or_default()
    }

    /// Pull one caller out of the queue for `url`.
    ///
    /// The entry itself stays, even when it runs empty: the exchange is still
    /// outstanding and later callers must keep joining it.
    pub(crate) fn remove(&mut self, url: &str, id: u64) -> Option<Waiter> {
        let waiters = self.entries.get_mut(url)?;
        let index = waiters.iter().position(|waiter| waiter.id == id)?;
        Some(waiters.remove(index))
    }
}

#[derive(Debug)]
struct CacheEntry {
    resource_path: String,
    response: Response,
}

/// Last normalized response per URL. No expiry; cleared explicitly.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    /// The cached response for `url`.
    pub fn get(&self, url: &str) -> Option<&Response> {
        self.entries.get(url).map(|entry| &entry.response)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `response` for `url`, remembering the resource path it was built from.
    pub fn insert(&mut self, url: impl Into<String>, resource_path: &str, response: Response) {
        self.entries.insert(
            url.into(),
            CacheEntry {
                resource_path: base_path(resource_path).to_string(),
                response,
            },
        );
    }

    /// Drop cached responses.
    ///
    /// `None` empties the cache. `Some(path)` drops the entries built from
    /// `path` or any path below it (`customers` also drops `customers/5`).
    /// Nested resources go with their parent: `time_entries` also drops
    /// `time_entries/bookmarks`.
    pub fn clear(&mut self, resource_path: Option<&str>) {
        match resource_path {
            None => self.entries.clear(),
            Some(path) => {
                let path = base_path(path);
                self.entries
                    .retain(|_, entry| !is_within(&entry.resource_path, path));
            }
        }
    }
}

/// Resource path without query fragment or surrounding slashes.
fn base_path(resource_path: &str) -> &str {
    let path = resource_path
        .split_once('?')
        .map_or(resource_path, |(path, _)| path);
    path.trim_matches('/')
}

fn is_within(candidate: &str, path: &str) -> bool {
    candidate == path
        || candidate
            .strip_prefix(path)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestMethod;
    use crate::response::Completion;

    fn response(body: &str) -> Response {
        Response::normalize(Completion::new(RequestMethod::Get, "u", 200, body)).unwrap()
    }

    fn waiter(id: u64) -> (Waiter, oneshot::Receiver<Result<Response>>) {
        let (reply, rx) = oneshot::channel();
        (Waiter::new(id, RequestOptions::new(), reply), rx)
    }

    #[test]
    fn test_enqueue_and_take() {
        let mut registry = InFlightRegistry::default();
        let (first, _rx1) = waiter(1);
        let (second, _rx2) = waiter(2);

        assert!(registry.enqueue("https://x/a.json", first));
        assert!(!registry.enqueue("https://x/a.json", second));
        assert_eq!(registry.waiting("https://x/a.json"), 2);
        assert_eq!(registry.len(), 1);

        let waiters = registry.take("https://x/a.json");
        assert_eq!(waiters.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.take("https://x/a.json").is_empty());
    }

    #[test]
    fn test_remove_keeps_entry() {
        let mut registry = InFlightRegistry::default();
        let (first, _rx1) = waiter(1);
        let (second, _rx2) = waiter(2);
        registry.enqueue("https://x/a.json", first);
        registry.enqueue("https://x/a.json", second);

        assert_eq!(registry.remove("https://x/a.json", 1).map(|w| w.id), Some(1));
        assert!(registry.remove("https://x/a.json", 1).is_none());
        assert_eq!(registry.remove("https://x/a.json", 2).map(|w| w.id), Some(2));

        // still in flight, so a new caller joins instead of leading
        assert!(registry.contains("https://x/a.json"));
        assert_eq!(registry.waiting("https://x/a.json"), 0);
        let (third, _rx3) = waiter(3);
        assert!(!registry.enqueue("https://x/a.json", third));
        assert!(registry.remove("https://x/b.json", 3).is_none());
    }

    #[test]
    fn test_cache_insert_get() {
        let mut cache = ResponseCache::default();
        cache.insert("https://x/a.json", "a", response("{}"));

        assert!(cache.contains("https://x/a.json"));
        assert!(cache.get("https://x/a.json").unwrap().is_success());
        assert!(cache.get("https://x/b.json").is_none());
    }

    #[test]
    fn test_cache_clear_all() {
        let mut cache = ResponseCache::default();
        cache.insert("https://x/a.json", "a", response("{}"));
        cache.insert("https://x/b.json", "b", response("{}"));

        cache.clear(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_clear_by_resource_path() {
        let mut cache = ResponseCache::default();
        cache.insert("https://x/customers.json", "customers", response("[]"));
        cache.insert("https://x/customers/5.json", "customers/5", response("{}"));
        cache.insert("https://x/customers/archived.json", "customers/archived", response("[]"));
        cache.insert("https://x/customers_old.json", "customers_old", response("[]"));
        cache.insert(
            "https://x/projects.json?customer_id=1",
            "projects?customer_id=1",
            response("[]"),
        );

        cache.clear(Some("customers"));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("https://x/customers_old.json"));
        assert!(cache.contains("https://x/projects.json?customer_id=1"));

        cache.clear(Some("projects"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_clear_takes_nested_resources() {
        let mut cache = ResponseCache::default();
        cache.insert("https://x/time_entries.json", "time_entries", response("[]"));
        cache.insert(
            "https://x/time_entries/bookmarks.json",
            "time_entries/bookmarks",
            response("[]"),
        );

        cache.clear(Some("time_entries/bookmarks"));
        assert!(cache.contains("https://x/time_entries.json"));
        assert_eq!(cache.len(), 1);

        cache.insert(
            "https://x/time_entries/bookmarks.json",
            "time_entries/bookmarks",
            response("[]"),
        );
        cache.clear(Some("time_entries"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_base_path() {
        assert_eq!(base_path("projects?customer_id=1"), "projects");
        assert_eq!(base_path("/time_entries/"), "time_entries");
        assert_eq!(base_path("tracker/5"), "tracker/5");
    }
}
