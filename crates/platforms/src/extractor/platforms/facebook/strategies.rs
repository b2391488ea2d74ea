use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use super::markers::{scan_desktop_page, scan_field_markers, scan_video_redirect};
use super::urls::rewrite_origin;
use crate::extractor::cascade::{Cascade, ExtractionStrategy};
use crate::extractor::error::ExtractorError;
use crate::extractor::platform_extractor::Extractor;
use crate::media::{CandidateMediaUrl, ExtractionAttempt};

// Old feature phone UA; the basic site only serves its redirect links to it.
const BASIC_MOBILE_UA: &str = "Mozilla/5.0 (Linux; U; Android 2.3.6; en-us; GT-S5360 Build/GINGERBREAD) AppleWebKit/533.1 (KHTML, like Gecko) Version/4.0 Mobile Safari/533.1";

/// Base urls of the three Facebook surfaces the strategies scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacebookEndpoints {
    pub mobile: String,
    pub desktop: String,
    pub basic: String,
}

impl Default for FacebookEndpoints {
    fn default() -> Self {
        Self {
            mobile: "https://m.facebook.com".to_string(),
            desktop: "https://www.facebook.com".to_string(),
            basic: "https://mbasic.facebook.com".to_string(),
        }
    }
}

impl FacebookEndpoints {
    /// Point every surface at the same base url. Used by tests that stand up
    /// a single local server.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            mobile: base.clone(),
            desktop: base.clone(),
            basic: base,
        }
    }
}

/// What every Facebook strategy needs to make its request.
pub struct FacebookContext {
    pub extractor: Extractor,
    pub endpoints: FacebookEndpoints,
}

impl FacebookContext {
    async fn fetch_html(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
    ) -> Result<String, ExtractorError> {
        let mut request = self.extractor.get(url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractorError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(url = %url, len = body.len(), "Fetched page");
        Ok(body)
    }
}

/// 1. Mobile video endpoint by id.
pub struct MobileVideoPage;

#[async_trait]
impl ExtractionStrategy<FacebookContext> for MobileVideoPage {
    fn name(&self) -> &'static str {
        "mobile_video_page"
    }

    async fn attempt(
        &self,
        attempt: &ExtractionAttempt,
        ctx: &FacebookContext,
    ) -> Result<Option<CandidateMediaUrl>, ExtractorError> {
        let url = format!(
            "{}/video.php?v={}",
            ctx.endpoints.mobile.trim_end_matches('/'),
            attempt.video_id
        );
        let html = ctx.fetch_html(&url, None).await?;
        Ok(scan_field_markers(&html))
    }
}

/// 2. The resolved page url itself, moved onto the mobile host.
pub struct MobileRewrite;

#[async_trait]
impl ExtractionStrategy<FacebookContext> for MobileRewrite {
    fn name(&self) -> &'static str {
        "mobile_rewrite"
    }

    async fn attempt(
        &self,
        attempt: &ExtractionAttempt,
        ctx: &FacebookContext,
    ) -> Result<Option<CandidateMediaUrl>, ExtractorError> {
        let url = rewrite_origin(&attempt.resolved_url, &ctx.endpoints.mobile)
            .ok_or_else(|| ExtractorError::InvalidUrl(attempt.resolved_url.clone()))?;
        let html = ctx.fetch_html(&url, None).await?;
        Ok(scan_field_markers(&html))
    }
}

/// 3. Desktop watch page, with the broader CDN scans as a last resort.
pub struct DesktopWatch;

#[async_trait]
impl ExtractionStrategy<FacebookContext> for DesktopWatch {
    fn name(&self) -> &'static str {
        "desktop_watch"
    }

    async fn attempt(
        &self,
        attempt: &ExtractionAttempt,
        ctx: &FacebookContext,
    ) -> Result<Option<CandidateMediaUrl>, ExtractorError> {
        let url = format!(
            "{}/watch/?v={}",
            ctx.endpoints.desktop.trim_end_matches('/'),
            attempt.video_id
        );
        let html = ctx.fetch_html(&url, None).await?;
        Ok(scan_desktop_page(&html))
    }
}

/// 4. Basic (legacy) mobile site. SD only.
pub struct BasicMobile;

#[async_trait]
impl ExtractionStrategy<FacebookContext> for BasicMobile {
    fn name(&self) -> &'static str {
        "basic_mobile"
    }

    async fn attempt(
        &self,
        attempt: &ExtractionAttempt,
        ctx: &FacebookContext,
    ) -> Result<Option<CandidateMediaUrl>, ExtractorError> {
        let url = format!(
            "{}/watch/?v={}",
            ctx.endpoints.basic.trim_end_matches('/'),
            attempt.video_id
        );
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(BASIC_MOBILE_UA),
        );
        let html = ctx.fetch_html(&url, Some(headers)).await?;
        Ok(scan_video_redirect(&html))
    }
}

/// The fixed strategy order. Later entries are less reliable.
pub fn default_cascade() -> Cascade<FacebookContext> {
    Cascade::new(vec![
        Box::new(MobileVideoPage),
        Box::new(MobileRewrite),
        Box::new(DesktopWatch),
        Box::new(BasicMobile),
    ])
}
