//! Users: read-only, active/archived listing.

use mite_client::Params;

use crate::call::ApiCall;
use crate::facade::Facade;
use crate::resource::{id_list, ActiveArchived, Lookup, Resource};

/// `users`
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    facade: &'a Facade,
}

impl<'a> Users<'a> {
    pub(crate) fn new(facade: &'a Facade) -> Self {
        Self { facade }
    }

    /// Time entries booked by any of the given users.
    pub fn time_entries_for(&self, ids: &[u64]) -> ApiCall {
        self.facade
            .get(format!("time_entries?user_id={}", id_list(ids)), Params::None)
    }
}

impl Resource for Users<'_> {
    const PATH: &'static str = "users";

    fn facade(&self) -> &Facade {
        self.facade
    }
}

impl ActiveArchived for Users<'_> {}
impl Lookup for Users<'_> {}
