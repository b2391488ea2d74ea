pub mod candidate;

pub use candidate::{CandidateMediaUrl, ExtractionAttempt, FallbackMedia, Quality};
