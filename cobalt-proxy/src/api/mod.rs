//! HTTP API: health, the buffer gateway and the cobalt front door.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, AppState};
