use mite_client::Params;

use crate::call::ApiCall;
use crate::facade::Facade;
use crate::resource::{id_list, ActiveArchived, Lookup, Mutation, Resource};

/// `services`
#[derive(Debug, Clone, Copy)]
pub struct Services<'a> {
    facade: &'a Facade,
}

impl<'a> Services<'a> {
    pub(crate) fn new(facade: &'a Facade) -> Self {
        Self { facade }
    }

    /// Time entries booked on any of the given services.
    pub fn time_entries_for(&self, ids: &[u64]) -> ApiCall {
        self.facade.get(
            format!("time_entries?service_id={}", id_list(ids)),
            Params::None,
        )
    }
}

impl Resource for Services<'_> {
    const PATH: &'static str = "services";

    fn facade(&self) -> &Facade {
        self.facade
    }
}

impl ActiveArchived for Services<'_> {}
impl Lookup for Services<'_> {}
impl Mutation for Services<'_> {}
