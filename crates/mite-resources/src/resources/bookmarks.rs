//! Bookmarks: read-only.

use mite_client::Params;

use crate::call::ApiCall;
use crate::facade::Facade;
use crate::resource::{Listing, Lookup, Resource};

/// `time_entries/bookmarks`
#[derive(Debug, Clone, Copy)]
pub struct Bookmarks<'a> {
    facade: &'a Facade,
}

impl<'a> Bookmarks<'a> {
    pub(crate) fn new(facade: &'a Facade) -> Self {
        Self { facade }
    }

    /// The time entries a bookmark points at.
    ///
    /// The API answers this path with a redirect to the filtered listing.
    pub fn time_entries_for(&self, id: u64) -> ApiCall {
        self.facade
            .get(format!("{}/follow", Self::member_path(id)), Params::None)
    }
}

impl Resource for Bookmarks<'_> {
    const PATH: &'static str = "time_entries/bookmarks";

    fn facade(&self) -> &Facade {
        self.facade
    }
}

impl Listing for Bookmarks<'_> {}
impl Lookup for Bookmarks<'_> {}
