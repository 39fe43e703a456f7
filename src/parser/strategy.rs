use async_trait::async_trait;

use crate::extractor::{ExtractedContent, ParsedContent};
use crate::fetcher::FetchOptions;
use crate::parser::ParseError;

pub const DEFAULT_STRATEGY_CONFIDENCE: u8 = 50;
pub const DEFAULT_EXTRACTOR_PRIORITY: u32 = 100;

/// Turns a URL into a draft article.
#[async_trait]
pub trait ParsingStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, url: &str, content_type: &str) -> bool;

    /// Selection score in `[0, 100]`.
    fn confidence_for(&self, _url: &str) -> u8 {
        DEFAULT_STRATEGY_CONFIDENCE
    }

    async fn prepare(&self, _options: &FetchOptions) -> Result<(), ParseError> {
        Ok(())
    }

    async fn parse(&self, url: &str, options: &FetchOptions) -> Result<ParsedContent, ParseError>;

    /// Releases whatever `prepare` or `parse` acquired. Runs after every attempt.
    async fn cleanup(&self) -> Result<(), ParseError> {
        Ok(())
    }
}

/// Drives a strategy and post-processes its draft into a final record.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Lower wins.
    fn priority(&self) -> u32 {
        DEFAULT_EXTRACTOR_PRIORITY
    }

    fn can_handle(&self, url: &str) -> bool;

    async fn extract(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<ExtractedContent, ParseError>;

    fn validate_content(&self, content: &ExtractedContent) -> bool {
        content.is_valid()
    }
}

pub(crate) fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
