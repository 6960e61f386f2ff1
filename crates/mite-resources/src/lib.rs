//! # mite-resources
//!
//! Resource facades for the mite time-tracking API.
//!
//! ## Features
//!
//! - **Time entries** - list, find, create, update, delete; typed yearly listing
//! - **Tracker** - find the running entry, start and stop it
//! - **Bookmarks** - saved time entry filters (read-only)
//! - **Customers, projects, services** - active/archived listings, CRUD, relations
//! - **Users** - active/archived listings (read-only)
//! - **Account, myself** - who the credentials belong to
//! - **Caching facade** - the same operations, with reads answered from cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use mite_client::MiteConfig;
//! use mite_resources::{ActiveArchived, Listing, Lookup, Mite, Mutation};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mite_resources::Error> {
//!     let mite = Mite::new(MiteConfig::from_env()?)?;
//!
//!     // Read
//!     let customer = mite.customers().find(42).await?;
//!     let projects = mite.customers().projects_for(&[42, 43]).await?;
//!
//!     // Create
//!     mite.time_entries()
//!         .create(json!({"minutes": 30, "project_id": 7}))
//!         .on_error(|_, message| eprintln!("could not book: {message}"))
//!         .await?;
//!
//!     // Cached reads
//!     let active = mite.cache().projects().active(()).await?;
//!     mite.cache().projects().clear_cache();
//!
//!     Ok(())
//! }
//! ```

mod call;
mod error;
mod facade;
mod resource;
mod resources;
mod types;

pub use call::ApiCall;
pub use error::{Error, ErrorKind, Result};
pub use facade::{Facade, Mite};
pub use resource::{ActiveArchived, Listing, Lookup, Mutation, Resource};
pub use resources::{Bookmarks, Customers, Projects, Services, TimeEntries, Tracker, Users};
pub use types::{TimeEntry, TimeEntryWrapper};

pub use mite_client::{Completion, MiteConfig, Outcome, Params, Response};
