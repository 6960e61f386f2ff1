//! The stopwatch: one running time entry at a time.

use serde_json::json;

use mite_client::Params;

use crate::call::ApiCall;
use crate::facade::Facade;

const TRACKER_PATH: &str = "tracker";

/// `tracker`
#[derive(Debug, Clone, Copy)]
pub struct Tracker<'a> {
    facade: &'a Facade,
}

impl<'a> Tracker<'a> {
    pub(crate) fn new(facade: &'a Facade) -> Self {
        Self { facade }
    }

    /// The currently running time entry, if any.
    pub fn find(&self) -> ApiCall {
        self.facade.get(TRACKER_PATH, Params::None)
    }

    /// Start tracking time on an entry.
    pub fn start(&self, id: u64) -> ApiCall {
        self.facade.put(format!("{TRACKER_PATH}/{id}"), json!({}))
    }

    /// Stop tracking time on an entry.
    pub fn stop(&self, id: u64) -> ApiCall {
        self.facade.delete(format!("{TRACKER_PATH}/{id}"))
    }

    /// Drop the cached tracker state.
    pub fn clear_cache(&self) {
        self.facade.clear_cache(Some(TRACKER_PATH));
    }
}
