//! Customers: active/archived listing, CRUD and relations.

use mite_client::Params;

use crate::call::ApiCall;
use crate::facade::Facade;
use crate::resource::{id_list, ActiveArchived, Lookup, Mutation, Resource};

/// `customers`
#[derive(Debug, Clone, Copy)]
pub struct Customers<'a> {
    facade: &'a Facade,
}

impl<'a> Customers<'a> {
    pub(crate) fn new(facade: &'a Facade) -> Self {
        Self { facade }
    }

    /// Projects belonging to any of the given customers.
    pub fn projects_for(&self, ids: &[u64]) -> ApiCall {
        self.facade
            .get(format!("projects?customer_id={}", id_list(ids)), Params::None)
    }

    /// Time entries booked on any of the given customers.
    pub fn time_entries_for(&self, ids: &[u64]) -> ApiCall {
        self.facade.get(
            format!("time_entries?customer_id={}", id_list(ids)),
            Params::None,
        )
    }
}

impl Resource for Customers<'_> {
    const PATH: &'static str = "customers";

    fn facade(&self) -> &Facade {
        self.facade
    }
}

impl ActiveArchived for Customers<'_> {}
impl Lookup for Customers<'_> {}
impl Mutation for Customers<'_> {}
