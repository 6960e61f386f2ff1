//! # mite-client
//!
//! Core HTTP client for the mite time-tracking API.
//!
//! This crate provides:
//! - Configuration with validation and environment loading
//! - URL and query-string construction
//! - A transport with async and blocking entry points
//! - Coalescing of concurrent identical GET requests
//! - An opt-in response cache
//! - Normalized success/error/complete notifications
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Resource facades                         │
//! │  (mite-resources)                                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MiteClient                            │
//! │  - In-flight registry (one GET per URL at a time)           │
//! │  - Response cache keyed by URL                              │
//! │  - Timeout alarm, callback fan-out                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Transport                            │
//! │  - reqwest async + blocking clients                         │
//! │  - X-MiteApiKey / X-MiteAccount headers                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use mite_client::{MiteClient, MiteConfig, Params, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mite_client::Error> {
//!     let config = MiteConfig::builder()
//!         .with_account("acme")
//!         .with_api_key("secret")
//!         .build()?;
//!     let client = MiteClient::new(config)?;
//!
//!     let response = client
//!         .get(
//!             "time_entries",
//!             Params::pair("year", 2024),
//!             RequestOptions::new().on_success(|entries| println!("{entries}")),
//!             false,
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

mod client;
mod config;
mod error;
pub mod query;
mod registry;
mod request;
mod response;
mod transport;

pub use client::MiteClient;
pub use config::{ErrorHandler, MiteConfig, MiteConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use query::{build_query, build_url, resource_name, Params};
pub use registry::{InFlightRegistry, ResponseCache};
pub use request::{
    CompleteCallback, ErrorCallback, Request, RequestBody, RequestMethod, RequestOptions,
    SuccessCallback,
};
pub use response::{parse_json_body, Completion, Outcome, Response, ERROR_MESSAGE, TIMEOUT_MESSAGE};
pub use transport::Transport;

/// Default transport scheme
pub const DEFAULT_PROTOCOL: &str = "https";

/// Default API domain
pub const DEFAULT_DOMAIN: &str = "mite.yo.lk";

/// Subdomain serving the API
pub const API_SUBDOMAIN: &str = "corsapi";

/// Suffix selecting the JSON representation of a resource
pub const FORMAT_SUFFIX: &str = ".json";

/// Default timeout window for a request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("mite-api/", env!("CARGO_PKG_VERSION"));
