//! # mite-api
//!
//! A client for the mite time-tracking API.
//!
//! ## Security
//!
//! - The API key is redacted in Debug output
//! - Tracing spans skip credential parameters
//! - The key header is marked sensitive on the wire
//!
//! ## Crates
//!
//! - **mite-client** - Configuration, transport, request coalescing, response cache
//! - **mite-resources** - Resource facades: time entries, tracker, bookmarks, customers, projects, services, users
//!
//! This crate adds revenue projections on top of the time entry listing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mite_api::{Mite, MiteConfig, Listing};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mite = Mite::new(MiteConfig::from_env()?)?;
//!
//!     let entries = mite.time_entries().all(()).await?;
//!     println!("{:?}", entries.payload());
//!
//!     let projection = mite_api::revenue::financial_metrics(&mite, 2024, chrono::Utc::now()).await?;
//!     println!("{}", mite_api::revenue::pretty_number(projection.per_year, "."));
//!
//!     Ok(())
//! }
//! ```

pub mod revenue;

// Re-export the member crates
pub use mite_client as client;
pub use mite_resources as resources;

// Commonly used types at the top level
pub use mite_client::{MiteClient, MiteConfig, Params, RequestOptions};
pub use mite_resources::{
    ActiveArchived, ApiCall, Error, Facade, Listing, Lookup, Mite, Mutation, Resource, Result,
    TimeEntry, TimeEntryWrapper,
};
pub use revenue::{financial_metrics, pretty_number, RevenueProjection};
