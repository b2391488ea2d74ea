use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality bucket of a recovered media URL.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Hd,
    Sd,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Hd => write!(f, "HD"),
            Quality::Sd => write!(f, "SD"),
        }
    }
}

/// A direct media URL found by one extraction strategy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CandidateMediaUrl {
    pub url: String,
    pub quality: Quality,
}

impl CandidateMediaUrl {
    pub fn new(url: impl Into<String>, quality: Quality) -> Self {
        Self {
            url: url.into(),
            quality,
        }
    }

    pub fn hd(url: impl Into<String>) -> Self {
        Self::new(url, Quality::Hd)
    }

    pub fn sd(url: impl Into<String>) -> Self {
        Self::new(url, Quality::Sd)
    }
}

impl fmt::Display for CandidateMediaUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.quality, self.url)
    }
}

/// Per-request state threaded through the strategy cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionAttempt {
    // url the client originally asked for
    pub source_url: String,
    // url after following at most one short-link redirect
    pub resolved_url: String,
    // platform video identifier parsed from `resolved_url`
    pub video_id: String,
}

/// Successful result of a fallback extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackMedia {
    pub video_id: String,
    pub media: CandidateMediaUrl,
}
