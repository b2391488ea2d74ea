use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::{debug, info};

use super::strategies::{FacebookContext, FacebookEndpoints, default_cascade};
use super::urls::{extract_video_id, is_short_link};
use crate::extractor::cascade::Cascade;
use crate::extractor::error::ExtractorError;
use crate::extractor::platform_extractor::{Extractor, PlatformExtractor};
use crate::media::{ExtractionAttempt, FallbackMedia};

pub struct Facebook {
    ctx: FacebookContext,
    // same relay and headers as `ctx.extractor.client`, but never follows redirects
    no_redirect_client: Client,
    cascade: Cascade<FacebookContext>,
}

/// Facebook fallback extractor.
///
/// Used when the upstream API reports an empty fetch for a Facebook url. It
/// normalizes the url, pulls out the video id and runs the strategy cascade
/// against Facebook's public pages.
impl Facebook {
    pub const PLATFORM_NAME: &'static str = "Facebook";

    pub fn new(
        url: String,
        client: Client,
        no_redirect_client: Client,
        cookies: Option<String>,
        endpoints: FacebookEndpoints,
    ) -> Self {
        let mut extractor = Extractor::new(Self::PLATFORM_NAME, url, client);
        if let Some(cookies) = cookies {
            extractor.set_cookies_from_string(&cookies);
        }

        Self {
            ctx: FacebookContext {
                extractor,
                endpoints,
            },
            no_redirect_client,
            cascade: default_cascade(),
        }
    }

    /// Follow exactly one redirect hop and return the `Location` target.
    async fn follow_one_redirect(&self, url: &str) -> Result<String, ExtractorError> {
        let response = self
            .ctx
            .extractor
            .request_with(&self.no_redirect_client, Method::GET, url)
            .send()
            .await?;

        if !response.status().is_redirection() {
            return Err(ExtractorError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ExtractorError::Other("redirect without Location".into()))?;

        let base = url::Url::parse(url).map_err(|_| ExtractorError::InvalidUrl(url.to_string()))?;
        let target = base
            .join(location)
            .map_err(|_| ExtractorError::InvalidUrl(location.to_string()))?;
        Ok(target.to_string())
    }

    /// Resolve short links (`fb.watch`, `/share/`) one hop. Falls back to the
    /// original url on any failure.
    pub async fn resolve_url(&self) -> String {
        let url = &self.ctx.extractor.url;
        if !is_short_link(url) {
            return url.clone();
        }

        match self.follow_one_redirect(url).await {
            Ok(resolved) => {
                debug!(from = %url, to = %resolved, "Resolved short link");
                resolved
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Short link resolution failed; using original url");
                url.clone()
            }
        }
    }
}

#[async_trait]
impl PlatformExtractor for Facebook {
    fn get_extractor(&self) -> &Extractor {
        &self.ctx.extractor
    }

    async fn extract(&self) -> Option<FallbackMedia> {
        let source_url = self.ctx.extractor.url.clone();
        let resolved_url = self.resolve_url().await;

        let Some(video_id) = extract_video_id(&resolved_url) else {
            debug!(url = %resolved_url, "No Facebook video id in url; skipping strategies");
            return None;
        };

        let attempt = ExtractionAttempt {
            source_url,
            resolved_url,
            video_id,
        };

        let media = self.cascade.run(&attempt, &self.ctx).await?;
        info!(
            video_id = %attempt.video_id,
            quality = %media.quality,
            "Facebook fallback recovered media url"
        );

        Some(FallbackMedia {
            video_id: attempt.video_id,
            media,
        })
    }
}
