use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

use crate::extractor::ParsedContent;
use crate::fetcher::FetchOptions;
use crate::parser::strategy::DEFAULT_STRATEGY_CONFIDENCE;
use crate::parser::{ParseError, ParsingStrategy};

pub type ParseFn = Arc<
    dyn for<'a> Fn(&'a str, &'a FetchOptions) -> BoxFuture<'a, Result<ParsedContent, ParseError>>
        + Send
        + Sync,
>;

/// Wraps a closure as a [`ParseFn`], pinning down its higher-ranked signature.
pub fn parse_fn<F>(f: F) -> ParseFn
where
    F: for<'a> Fn(&'a str, &'a FetchOptions) -> BoxFuture<'a, Result<ParsedContent, ParseError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Data-driven strategy: URL patterns, a fixed confidence and a parse function.
#[derive(Clone)]
pub struct CustomStrategy {
    name: String,
    url_patterns: Vec<String>,
    confidence: u8,
    parse_fn: ParseFn,
}

impl CustomStrategy {
    /// Supports every URL with confidence 50 until narrowed.
    pub fn new(name: impl Into<String>, parse_fn: ParseFn) -> Self {
        Self {
            name: name.into(),
            url_patterns: Vec::new(),
            confidence: DEFAULT_STRATEGY_CONFIDENCE,
            parse_fn,
        }
    }

    /// Restricts the strategy to URLs containing any of `patterns`.
    pub fn with_url_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }
}

impl fmt::Debug for CustomStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomStrategy")
            .field("name", &self.name)
            .field("url_patterns", &self.url_patterns)
            .field("confidence", &self.confidence)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ParsingStrategy for CustomStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, url: &str, _content_type: &str) -> bool {
        self.url_patterns.is_empty() || self.url_patterns.iter().any(|p| url.contains(p.as_str()))
    }

    fn confidence_for(&self, _url: &str) -> u8 {
        self.confidence
    }

    async fn parse(&self, url: &str, options: &FetchOptions) -> Result<ParsedContent, ParseError> {
        let mut draft = (self.parse_fn)(url, options).await?;
        if draft.parsing_strategy.is_empty() {
            draft.parsing_strategy = self.name.clone();
        }
        Ok(draft)
    }
}
