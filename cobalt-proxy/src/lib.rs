//! cobalt-proxy library crate.
//!
//! Signs cobalt tunnel links so only this proxy can redeem them, and falls
//! back to scraping Facebook when cobalt comes back empty.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod rewrite;
pub mod signing;
pub mod upstream;
pub mod utils;

pub use error::{Error, Result};
