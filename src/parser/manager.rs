use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::extractor::{ExtractedContent, MIN_CONFIDENCE, ParsedContent, compute_confidence};
use crate::fetcher::FetchOptions;
use crate::parser::registry::{ExtractorRegistry, StrategyRegistry};
use crate::parser::{ContentExtractor, ParseError, ParsingStrategy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParserStatus {
    pub initialized: bool,
    pub strategies: Vec<String>,
    pub extractors: Vec<String>,
}

/// Entry point for parsing and extraction requests.
///
/// Cheap to share: both registries sit behind `Arc`s and are read-mostly.
#[derive(Default)]
pub struct ParserManager {
    strategies: Arc<StrategyRegistry>,
    extractors: Arc<ExtractorRegistry>,
}

impl ParserManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategies(&self) -> &Arc<StrategyRegistry> {
        &self.strategies
    }

    pub fn extractors(&self) -> &Arc<ExtractorRegistry> {
        &self.extractors
    }

    pub fn register_strategy(
        &self,
        strategy: Arc<dyn ParsingStrategy>,
        is_default: bool,
    ) -> Result<(), ParseError> {
        self.strategies.register(strategy, is_default)
    }

    pub fn register_extractor(&self, extractor: Arc<dyn ContentExtractor>) -> Result<(), ParseError> {
        self.extractors.register(extractor)
    }

    pub fn set_default_strategy(&self, name: &str) -> Result<(), ParseError> {
        self.strategies.set_default(name)
    }

    pub fn find_best_strategy(&self, url: &str, content_type: &str) -> Option<Arc<dyn ParsingStrategy>> {
        self.strategies.find_best(url, content_type)
    }

    pub fn find_best_extractor(&self, url: &str) -> Option<Arc<dyn ContentExtractor>> {
        self.extractors.find_best(url)
    }

    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.names()
    }

    pub fn extractor_names(&self) -> Vec<String> {
        self.extractors.names()
    }

    pub fn status(&self) -> ParserStatus {
        let strategies = self.strategy_names();
        ParserStatus {
            initialized: !strategies.is_empty(),
            strategies,
            extractors: self.extractor_names(),
        }
    }

    /// Runs one strategy end to end and returns the cleaned, scored draft.
    pub async fn parse_content(
        &self,
        url: &str,
        content_type: &str,
        options: &FetchOptions,
    ) -> Result<ParsedContent, ParseError> {
        parse_with(&self.strategies, url, content_type, options).await
    }

    /// Picks an extractor for `url`, runs it and validates its record.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract_content(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<ExtractedContent, ParseError> {
        let started = Instant::now();
        info!("Starting content extraction for URL: {}", url);

        let result = self.run_extractor(url, options).await;
        let elapsed = started.elapsed().as_millis();
        match &result {
            Ok(_) => info!("Content extraction completed in {}ms for URL: {}", elapsed, url),
            Err(e) => error!(
                kind = e.kind(),
                "Content extraction failed after {}ms for URL: {}: {}", elapsed, url, e
            ),
        }
        result
    }

    async fn run_extractor(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<ExtractedContent, ParseError> {
        let extractor = self
            .find_best_extractor(url)
            .ok_or_else(|| ParseError::NoExtractor(url.to_string()))?;
        debug!("Using extractor: {}", extractor.name());

        let content = extractor.extract(url, options).await?;
        if !extractor.validate_content(&content) {
            return Err(ParseError::Validation);
        }
        Ok(content)
    }
}

/// Select, prepare, parse, score, clean, cleanup.
///
/// Shared by the manager and by extractors, which only hold the strategy registry.
#[instrument(skip_all, fields(url = %url))]
pub(crate) async fn parse_with(
    strategies: &StrategyRegistry,
    url: &str,
    content_type: &str,
    options: &FetchOptions,
) -> Result<ParsedContent, ParseError> {
    let started = Instant::now();
    info!("Starting content parsing for URL: {}", url);

    let result = select_and_run(strategies, url, content_type, options, started).await;
    let elapsed = started.elapsed().as_millis();
    match &result {
        Ok(draft) => info!(
            "Content parsing completed in {}ms for URL: {} (confidence {})",
            elapsed, url, draft.confidence
        ),
        Err(e) => error!(
            kind = e.kind(),
            "Content parsing failed after {}ms for URL: {}: {}", elapsed, url, e
        ),
    }
    result
}

async fn select_and_run(
    strategies: &StrategyRegistry,
    url: &str,
    content_type: &str,
    options: &FetchOptions,
    started: Instant,
) -> Result<ParsedContent, ParseError> {
    let strategy = match options.strategy.as_deref() {
        Some(name) => strategies.get(name),
        None => strategies.find_best(url, content_type),
    }
    .ok_or_else(|| ParseError::NoStrategy(url.to_string()))?;
    debug!("Using parsing strategy: {}", strategy.name());

    let outcome = run_strategy(strategy.as_ref(), url, options).await;
    if let Err(e) = strategy.cleanup().await {
        warn!("Cleanup of strategy {} failed: {}", strategy.name(), e);
    }

    let mut draft = outcome?;
    draft.parsing_time = started.elapsed().as_millis() as u64;
    if !draft.is_valid() {
        return Err(ParseError::LowConfidence {
            confidence: draft.confidence,
            minimum: MIN_CONFIDENCE,
        });
    }
    Ok(draft)
}

async fn run_strategy(
    strategy: &dyn ParsingStrategy,
    url: &str,
    options: &FetchOptions,
) -> Result<ParsedContent, ParseError> {
    strategy.prepare(options).await?;
    let mut draft = strategy.parse(url, options).await?;
    if draft.parsing_strategy.is_empty() {
        draft.parsing_strategy = strategy.name().to_string();
    }
    compute_confidence(&mut draft);
    draft.clean();
    Ok(draft)
}
