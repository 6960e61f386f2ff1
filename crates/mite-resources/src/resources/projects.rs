use mite_client::Params;

use crate::call::ApiCall;
use crate::facade::Facade;
use crate::resource::{id_list, ActiveArchived, Lookup, Mutation, Resource};

/// `projects`
#[derive(Debug, Clone, Copy)]
pub struct Projects<'a> {
    facade: &'a Facade,
}

impl<'a> Projects<'a> {
    pub(crate) fn new(facade: &'a Facade) -> Self {
        Self { facade }
    }

    /// Time entries booked on any of the given projects.
    pub fn time_entries_for(&self, ids: &[u64]) -> ApiCall {
        self.facade.get(
            format!("time_entries?project_id={}", id_list(ids)),
            Params::None,
        )
    }
}

impl Resource for Projects<'_> {
    const PATH: &'static str = "projects";

    fn facade(&self) -> &Facade {
        self.facade
    }
}

impl ActiveArchived for Projects<'_> {}
impl Lookup for Projects<'_> {}
impl Mutation for Projects<'_> {}
