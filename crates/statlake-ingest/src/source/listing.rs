//! Listing-page source: scrape a publisher index page for file links

use super::{Candidate, SourceAdapter};
use crate::config::HttpConfig;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Source adapter that extracts links from an HTML listing page
///
/// Every `<a href>` whose target begins with the configured prefix becomes a
/// candidate. Unexpected markup degrades to an empty candidate list; only
/// transport failures are `SourceUnavailable`.
pub struct ListingPageSource {
    client: Client,
    page_url: String,
    link_prefix: String,
}

impl ListingPageSource {
    pub fn new(page_url: String, link_prefix: String, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(|e| IngestError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            page_url,
            link_prefix,
        })
    }

    async fn fetch_listing(&self) -> Result<String> {
        debug!(url = %self.page_url, "Fetching listing page");

        let response = self
            .client
            .get(&self.page_url)
            .send()
            .await
            .map_err(|e| IngestError::SourceUnavailable(format!("{}: {}", self.page_url, e)))?;

        if !response.status().is_success() {
            return Err(IngestError::SourceUnavailable(format!(
                "{}: HTTP status {}",
                self.page_url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| IngestError::SourceUnavailable(format!("{}: {}", self.page_url, e)))
    }

    fn parse_listing(&self, html: &str) -> Result<Vec<Candidate>> {
        let base = Url::parse(&self.page_url).map_err(|e| {
            IngestError::SourceUnavailable(format!("invalid page URL '{}': {}", self.page_url, e))
        })?;

        let document = Html::parse_document(html);
        // Static selector, cannot fail to parse.
        let link_selector = Selector::parse("a").unwrap();

        let mut candidates = Vec::new();

        for element in document.select(&link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if !href.starts_with(&self.link_prefix) {
                continue;
            }

            let Ok(url) = base.join(href) else {
                debug!(href = %href, "Skipping link that does not resolve");
                continue;
            };

            let Some(filename) = url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_string())
            else {
                continue;
            };

            candidates.push(Candidate {
                key: filename.clone(),
                filename,
                url: url.to_string(),
            });
        }

        Ok(candidates)
    }
}

#[async_trait]
impl SourceAdapter for ListingPageSource {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let html = self.fetch_listing().await?;
        let candidates = self.parse_listing(&html)?;

        info!(
            page = %self.page_url,
            count = candidates.len(),
            "Extracted candidate links"
        );

        Ok(candidates)
    }
}
