//! Concrete resource facades.

mod bookmarks;
mod customers;
mod projects;
mod services;
mod time_entries;
mod tracker;
mod users;

pub use bookmarks::Bookmarks;
pub use customers::Customers;
pub use projects::Projects;
pub use services::Services;
pub use time_entries::TimeEntries;
pub use tracker::Tracker;
pub use users::Users;
