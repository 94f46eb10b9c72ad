//! Daily roll call: members mark themselves present or justify an absence,
//! admins review and edit the day's records.

pub mod config;
pub mod directory;
pub mod error;
pub mod init;
pub mod logging;
pub mod model;
pub mod registry;
pub mod report;
pub mod session;
pub mod store;

pub use error::{Error, Result};
