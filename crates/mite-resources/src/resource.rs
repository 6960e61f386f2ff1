//! Capability traits shared by the resource facades.
//!
//! Each resource type declares the operation sets it supports by
//! implementing the matching traits. A read-only resource simply does not
//! implement [`Mutation`]; an active/archived resource implements
//! [`ActiveArchived`] instead of [`Listing`].

use serde_json::{Map, Value};

use mite_client::{resource_name, Params};

use crate::call::ApiCall;
use crate::facade::Facade;

/// A resource type rooted at a fixed path.
pub trait Resource {
    /// Base path segment, e.g. `time_entries`.
    const PATH: &'static str;

    /// The facade this resource was obtained from.
    fn facade(&self) -> &Facade;

    /// Singular name used to wrap write payloads (`time_entries` -> `time_entry`).
    fn name() -> String {
        resource_name(Self::PATH)
    }

    /// Wrap `params` under the singular resource name.
    fn wrap(params: Value) -> Value {
        let mut wrapped = Map::new();
        wrapped.insert(Self::name(), params);
        Value::Object(wrapped)
    }

    /// Path of a single record.
    fn member_path(id: u64) -> String {
        format!("{}/{}", Self::PATH, id)
    }

    /// Drop every cached response built from this resource's path.
    ///
    /// Paths nested below it go too: clearing time entries also clears bookmarks.
    fn clear_cache(&self) {
        self.facade().clear_cache(Some(Self::PATH));
    }
}

/// Plain listing.
pub trait Listing: Resource {
    /// `GET <path>.json`
    fn all(&self, params: impl Into<Params>) -> ApiCall {
        self.facade().get(Self::PATH, params)
    }
}

/// Lookup of a single record.
pub trait Lookup: Resource {
    /// `GET <path>/<id>.json`
    fn find(&self, id: u64) -> ApiCall {
        self.facade().get(Self::member_path(id), Params::None)
    }
}

/// Create, update and delete.
pub trait Mutation: Resource {
    /// `POST <path>.json` with `{"<name>": params}`
    fn create(&self, params: Value) -> ApiCall {
        self.facade().post(Self::PATH, Self::wrap(params))
    }

    /// `PUT <path>/<id>.json` with `{"<name>": params}`
    fn update(&self, id: u64, params: Value) -> ApiCall {
        self.facade().put(Self::member_path(id), Self::wrap(params))
    }

    /// `DELETE <path>/<id>.json`
    fn destroy(&self, id: u64) -> ApiCall {
        self.facade().delete(Self::member_path(id))
    }
}

/// Listing split into active and archived records.
pub trait ActiveArchived: Resource {
    /// `GET <path>.json`
    fn active(&self, params: impl Into<Params>) -> ApiCall {
        self.facade().get(Self::PATH, params)
    }

    /// `GET <path>/archived.json`
    fn archived(&self, params: impl Into<Params>) -> ApiCall {
        self.facade().get(format!("{}/archived", Self::PATH), params)
    }
}

/// Comma-joined id list for relation queries.
pub(crate) fn id_list(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
