pub mod cascade;
mod default;
pub mod error;
pub mod factory;
pub mod platform_extractor;
pub mod platforms;
pub mod utils;

pub use default::{
    DEFAULT_UA, create_client_builder, create_no_redirect_client_builder, install_rustls_provider,
};
