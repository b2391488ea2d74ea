mod builder;
pub mod markers;
pub mod strategies;
pub mod urls;

pub use builder::Facebook;
pub use strategies::{FacebookContext, FacebookEndpoints, default_cascade};
pub use urls::{URL_REGEX, extract_video_id, is_cdn_host, is_media_host, is_short_link};
