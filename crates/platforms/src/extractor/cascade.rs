use async_trait::async_trait;
use tracing::{debug, warn};

use crate::extractor::error::ExtractorError;
use crate::media::{CandidateMediaUrl, ExtractionAttempt};

/// One independent way of recovering a media url.
///
/// `C` is the platform context the strategy needs (clients, endpoints...).
/// `Ok(None)` means the strategy ran but found nothing; `Err` means it could
/// not run to completion. The cascade treats both as "try the next one".
#[async_trait]
pub trait ExtractionStrategy<C: Sync>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        attempt: &ExtractionAttempt,
        ctx: &C,
    ) -> Result<Option<CandidateMediaUrl>, ExtractorError>;
}

/// Ordered, short-circuiting list of strategies.
///
/// The first strategy returning a candidate wins. No quality comparison is
/// made across strategies, so a later HD result never replaces an earlier SD
/// one.
pub struct Cascade<C: Sync> {
    strategies: Vec<Box<dyn ExtractionStrategy<C>>>,
}

impl<C: Sync> Cascade<C> {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy<C>>>) -> Self {
        Self { strategies }
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|s| s.name())
    }

    /// Run every strategy in order until one yields a candidate.
    ///
    /// Returns `None` when all strategies are exhausted.
    pub async fn run(&self, attempt: &ExtractionAttempt, ctx: &C) -> Option<CandidateMediaUrl> {
        for strategy in &self.strategies {
            match strategy.attempt(attempt, ctx).await {
                Ok(Some(candidate)) => {
                    debug!(
                        strategy = strategy.name(),
                        video_id = %attempt.video_id,
                        quality = %candidate.quality,
                        "Strategy found media url"
                    );
                    return Some(candidate);
                }
                Ok(None) => {
                    debug!(
                        strategy = strategy.name(),
                        video_id = %attempt.video_id,
                        "Strategy found no match"
                    );
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        video_id = %attempt.video_id,
                        error = %e,
                        "Strategy failed"
                    );
                }
            }
        }

        debug!(video_id = %attempt.video_id, "All strategies exhausted");
        None
    }
}
