use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use crate::extractor::{self, ParsedContent};
use crate::fetcher::{FetchOptions, Fetcher};
use crate::parser::strategy::is_web_url;
use crate::parser::{ParseError, ParsingStrategy};

pub const READABILITY_STRATEGY: &str = "readability";

const CHARS_PER_READING_MINUTE: usize = 200;
const PLATFORM_DOMAINS: [&str; 4] = ["linkedin.com", "medium.com", "dev.to", "hackernoon.com"];
const ARTICLE_HINTS: [&str; 3] = ["blog", "news", "article"];

/// Readability-based extraction over rendered (or fetched) markup.
pub struct ReadabilityStrategy {
    fetcher: Arc<Fetcher>,
    default_language: String,
}

impl ReadabilityStrategy {
    pub fn new(fetcher: Arc<Fetcher>, default_language: impl Into<String>) -> Self {
        Self {
            fetcher,
            default_language: default_language.into(),
        }
    }
}

#[async_trait]
impl ParsingStrategy for ReadabilityStrategy {
    fn name(&self) -> &str {
        READABILITY_STRATEGY
    }

    fn supports(&self, url: &str, _content_type: &str) -> bool {
        is_web_url(url)
    }

    fn confidence_for(&self, url: &str) -> u8 {
        if PLATFORM_DOMAINS.iter().any(|domain| url.contains(domain)) {
            90
        } else if ARTICLE_HINTS.iter().any(|hint| url.contains(hint)) {
            80
        } else {
            70
        }
    }

    async fn prepare(&self, _options: &FetchOptions) -> Result<(), ParseError> {
        // The browser is optional (fetches fall back to HTTP); the HTTP client is not.
        self.fetcher
            .http_client()
            .map_err(|e| ParseError::Dependency(format!("readability HTTP client: {e}")))?;
        debug!(
            "Readability strategy prepared (renderer: {})",
            self.fetcher.renderer_name()
        );
        Ok(())
    }

    #[instrument(skip_all, fields(url = %url, strategy = READABILITY_STRATEGY))]
    async fn parse(&self, url: &str, options: &FetchOptions) -> Result<ParsedContent, ParseError> {
        let started = Instant::now();

        let page = self.fetcher.fetch(url, options).await?;
        if page.final_url.as_str() != url {
            debug!("Resolving content against {}", page.final_url);
        }
        let mut draft = extractor::extract(&page.markup, &page.final_url, &self.default_language)?;

        let characters = draft.content.chars().count();
        draft.metadata.insert(
            "readingTimeMinutes".into(),
            Value::from(characters.div_ceil(CHARS_PER_READING_MINUTE)),
        );
        draft
            .metadata
            .insert("characterCount".into(), Value::from(characters));
        draft.parsing_strategy = READABILITY_STRATEGY.to_string();
        draft.parsing_time = started.elapsed().as_millis() as u64;

        debug!("Readability parsing completed ({} characters)", characters);
        Ok(draft)
    }

    async fn cleanup(&self) -> Result<(), ParseError> {
        // Rendering sessions are closed by the renderer itself.
        debug!("Readability strategy cleanup completed");
        Ok(())
    }
}
