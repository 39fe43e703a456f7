use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use url::Url;
use utoipa::ToSchema;

use crate::extractor::{ExtractedContent, ParsedContent};
use crate::fetcher::{FetchOptions, WaitUntil};

pub const MAX_BATCH_SIZE: usize = 10;

/// Optional request knobs; anything omitted takes the service default.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub strategy: Option<String>,
    /// Milliseconds, 1000 to 60000.
    pub timeout: Option<u64>,
    pub wait_until: Option<WaitUntil>,
    pub wait_for_selector: Option<String>,
    /// Extra milliseconds to wait after load, at most 10000.
    pub delay: Option<u64>,
    pub load_media: Option<bool>,
    pub user_agent: Option<String>,
}

impl RequestOptions {
    pub fn into_fetch_options(self, default_timeout_ms: u64) -> FetchOptions {
        let defaults = FetchOptions::default();
        FetchOptions {
            strategy: self.strategy,
            timeout_ms: self.timeout.unwrap_or(default_timeout_ms),
            wait_until: self.wait_until.unwrap_or(defaults.wait_until),
            wait_for_selector: self.wait_for_selector,
            delay_ms: self.delay.unwrap_or(defaults.delay_ms),
            load_media: self.load_media.unwrap_or(defaults.load_media),
            user_agent: self.user_agent,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ParseRequest {
    pub url: String,
    #[serde(default)]
    pub options: Option<RequestOptions>,
}

impl ParseRequest {
    /// Checks the URL and option ranges, returning the options to run with.
    pub fn validate(&self, default_timeout_ms: u64) -> Result<FetchOptions, String> {
        if self.url.trim().is_empty() {
            return Err("\"url\" is not allowed to be empty".to_string());
        }
        if Url::parse(&self.url).is_err() {
            return Err("\"url\" must be a valid uri".to_string());
        }

        let options = self
            .options
            .clone()
            .unwrap_or_default()
            .into_fetch_options(default_timeout_ms);
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchParseRequest {
    pub urls: Vec<ParseRequest>,
}

impl BatchParseRequest {
    pub fn validate(&self, default_timeout_ms: u64) -> Result<Vec<FetchOptions>, String> {
        if self.urls.is_empty() || self.urls.len() > MAX_BATCH_SIZE {
            return Err(format!(
                "\"urls\" must contain between 1 and {} items",
                MAX_BATCH_SIZE
            ));
        }
        self.urls
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.validate(default_timeout_ms)
                    .map_err(|e| format!("urls[{}]: {}", index, e))
            })
            .collect()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Milliseconds spent handling the request.
    pub processing_time: u64,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl ResponseMetadata {
    pub fn since(started: Instant) -> Self {
        Self {
            processing_time: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParseData {
    pub content: ParsedContent,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParseResponse {
    pub success: bool,
    pub data: ParseData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractData {
    pub content: ExtractedContent,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractResponse {
    pub success: bool,
    pub data: ExtractData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchItemResult {
    pub index: usize,
    pub url: String,
    pub success: bool,
    pub data: Option<ParsedContent>,
    pub error: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of(results: &[BatchItemResult]) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchData {
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchParseResponse {
    pub success: bool,
    pub data: BatchData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StrategyInfo {
    pub name: String,
    pub supports: String,
    pub confidence: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StrategiesData {
    pub strategies: Vec<StrategyInfo>,
    pub default: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StrategiesResponse {
    pub success: bool,
    pub data: StrategiesData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParserHealthResponse {
    pub success: bool,
    pub service: String,
    pub parsers: String,
    pub strategies: Vec<String>,
    pub extractors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}
