//! Time entries: full CRUD.

use tracing::instrument;

use mite_client::Params;

use crate::error::Result;
use crate::facade::Facade;
use crate::resource::{Listing, Lookup, Mutation, Resource};
use crate::types::TimeEntryWrapper;

/// `time_entries`
///
/// Grouped listings use the same endpoint; pass `group_by` through
/// [`Listing::all`].
#[derive(Debug, Clone, Copy)]
pub struct TimeEntries<'a> {
    facade: &'a Facade,
}

impl<'a> TimeEntries<'a> {
    pub(crate) fn new(facade: &'a Facade) -> Self {
        Self { facade }
    }

    /// All time entries of `year`, decoded.
    #[instrument(skip(self))]
    pub async fn for_year(&self, year: i32) -> Result<Vec<TimeEntryWrapper>> {
        self.all(Params::pair("year", year)).decode().await
    }
}

impl Resource for TimeEntries<'_> {
    const PATH: &'static str = "time_entries";

    fn facade(&self) -> &Facade {
        self.facade
    }
}

impl Listing for TimeEntries<'_> {}
impl Lookup for TimeEntries<'_> {}
impl Mutation for TimeEntries<'_> {}
