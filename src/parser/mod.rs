//! Strategy and extractor registries and the request orchestrator.

pub mod custom;
pub mod errors;
pub mod extractors;
pub mod factory;
pub mod manager;
pub mod readability;
pub mod registry;
pub mod strategy;

pub use custom::{CustomStrategy, ParseFn, parse_fn};
pub use errors::ParseError;
pub use extractors::BaseExtractor;
pub use factory::ParserFactory;
pub use manager::{ParserManager, ParserStatus};
pub use readability::{READABILITY_STRATEGY, ReadabilityStrategy};
pub use registry::{ExtractorRegistry, StrategyRegistry};
pub use strategy::{ContentExtractor, ParsingStrategy};
