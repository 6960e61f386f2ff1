//! The top-level `Mite` handle and its two facades.

use std::ops::Deref;

use serde_json::Value;
use tracing::instrument;

use mite_client::{MiteClient, MiteConfig, Params, RequestMethod};

use crate::call::ApiCall;
use crate::error::Result;
use crate::resources::{Bookmarks, Customers, Projects, Services, TimeEntries, Tracker, Users};

/// Entry point for the mite API.
///
/// Holds a plain facade and a caching facade over one shared client. The
/// plain facade is reachable directly through `Deref`; the caching one
/// through [`Mite::cache`]. Both record responses in the cache, only the
/// caching facade reads from it.
///
/// # Example
///
/// ```rust,ignore
/// use mite_resources::{Mite, Listing, Mutation};
/// use mite_client::MiteConfig;
///
/// let mite = Mite::new(MiteConfig::from_env()?)?;
///
/// // network every time
/// let entries = mite.time_entries().all(()).await?;
///
/// // served from cache after the first call
/// let projects = mite.cache().projects().active(()).await?;
///
/// mite.time_entries()
///     .create(json!({"minutes": 30, "note": "review"}))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Mite {
    plain: Facade,
    cache: Facade,
}

impl Mite {
    /// Create a handle for the configured account.
    pub fn new(config: MiteConfig) -> Result<Self> {
        let client = MiteClient::new(config)?;
        Ok(Self::from_client(client))
    }

    /// Create a handle from an existing client.
    pub fn from_client(client: MiteClient) -> Self {
        Self {
            plain: Facade::new(client.clone(), false),
            cache: Facade::new(client, true),
        }
    }

    /// The facade that always goes to the network.
    pub fn plain(&self) -> &Facade {
        &self.plain
    }

    /// The facade that answers reads from the cache when it can.
    pub fn cache(&self) -> &Facade {
        &self.cache
    }
}

impl Deref for Mite {
    type Target = Facade;

    fn deref(&self) -> &Facade {
        &self.plain
    }
}

/// Named operations over the mite resources.
#[derive(Debug, Clone)]
pub struct Facade {
    client: MiteClient,
    use_cache: bool,
}

impl Facade {
    pub(crate) fn new(client: MiteClient, use_cache: bool) -> Self {
        Self { client, use_cache }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &MiteClient {
        &self.client
    }

    /// Returns true if reads are answered from the cache.
    pub fn uses_cache(&self) -> bool {
        self.use_cache
    }

    /// Read an arbitrary resource path.
    pub fn get(&self, resource_path: impl Into<String>, params: impl Into<Params>) -> ApiCall {
        ApiCall::get(
            self.client.clone(),
            resource_path,
            params.into(),
            self.use_cache,
        )
    }

    /// Create at an arbitrary resource path.
    pub fn post(&self, resource_path: impl Into<String>, body: Value) -> ApiCall {
        ApiCall::write(self.client.clone(), RequestMethod::Post, resource_path, body)
    }

    /// Update at an arbitrary resource path.
    pub fn put(&self, resource_path: impl Into<String>, body: Value) -> ApiCall {
        ApiCall::write(self.client.clone(), RequestMethod::Put, resource_path, body)
    }

    /// Delete at an arbitrary resource path.
    pub fn delete(&self, resource_path: impl Into<String>) -> ApiCall {
        ApiCall::write(
            self.client.clone(),
            RequestMethod::Delete,
            resource_path,
            Value::Null,
        )
    }

    /// The account the credentials belong to.
    pub fn account(&self) -> ApiCall {
        self.get("account", Params::None)
    }

    /// The user the API key belongs to.
    pub fn myself(&self) -> ApiCall {
        self.get("myself", Params::None)
    }

    pub fn time_entries(&self) -> TimeEntries<'_> {
        TimeEntries::new(self)
    }

    pub fn bookmarks(&self) -> Bookmarks<'_> {
        Bookmarks::new(self)
    }

    pub fn customers(&self) -> Customers<'_> {
        Customers::new(self)
    }

    pub fn projects(&self) -> Projects<'_> {
        Projects::new(self)
    }

    pub fn services(&self) -> Services<'_> {
        Services::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn tracker(&self) -> Tracker<'_> {
        Tracker::new(self)
    }

    /// Drop cached responses: all of them, or those built from `resource_path`.
    ///
    /// The cache is shared by both facades.
    #[instrument(skip(self))]
    pub fn clear_cache(&self, resource_path: Option<&str>) {
        self.client.clear_cache(resource_path);
    }
}
