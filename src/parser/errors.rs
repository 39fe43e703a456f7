use thiserror::Error;

use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("No suitable parsing strategy found for URL: {0}")]
    NoStrategy(String),

    #[error("No suitable extractor found for URL: {0}")]
    NoExtractor(String),

    #[error("dependency unavailable: {0}")]
    Dependency(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("content extraction failed: {0}")]
    Extraction(String),

    #[error("Extracted content validation failed")]
    Validation,

    #[error("extraction confidence {confidence} does not exceed the minimum of {minimum}")]
    LowConfidence { confidence: u8, minimum: u8 },

    #[error("URL not supported by {extractor}: {url}")]
    Unsupported { extractor: String, url: String },
}

impl ParseError {
    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::NoStrategy(_) => "NoStrategyError",
            Self::NoExtractor(_) => "NoExtractorError",
            Self::Dependency(_) => "DependencyError",
            Self::Fetch(_) => "FetchError",
            Self::Extraction(_) => "ExtractionError",
            Self::Validation => "ValidationError",
            Self::LowConfidence { .. } => "LowConfidenceError",
            Self::Unsupported { .. } => "UnsupportedUrlError",
        }
    }

    /// Whether the failure is about the requested page rather than the service.
    pub fn is_parsing_failure(&self) -> bool {
        !matches!(self, Self::Configuration(_) | Self::Dependency(_))
    }
}
