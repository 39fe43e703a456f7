use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::parser::{ContentExtractor, ParseError, ParsingStrategy};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn checked_name(name: &str, what: &str) -> Result<String, ParseError> {
    if name.trim().is_empty() {
        return Err(ParseError::Configuration(format!("{what} must have a non-empty name")));
    }
    Ok(name.to_string())
}

#[derive(Default)]
struct StrategySet {
    entries: Vec<Arc<dyn ParsingStrategy>>,
    default: Option<Arc<dyn ParsingStrategy>>,
}

/// Named parsing strategies in registration order.
#[derive(Default)]
pub struct StrategyRegistry {
    inner: RwLock<StrategySet>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a strategy. The first strategy registered, or any
    /// registered with `is_default`, becomes the fallback.
    pub fn register(
        &self,
        strategy: Arc<dyn ParsingStrategy>,
        is_default: bool,
    ) -> Result<(), ParseError> {
        let name = checked_name(strategy.name(), "parsing strategy")?;
        let mut set = write(&self.inner);

        match set.entries.iter().position(|s| s.name() == name) {
            Some(index) => set.entries[index] = Arc::clone(&strategy),
            None => set.entries.push(Arc::clone(&strategy)),
        }

        let replaces_default = set
            .default
            .as_ref()
            .is_some_and(|current| current.name() == name);
        if is_default || set.entries.len() == 1 || replaces_default {
            set.default = Some(strategy);
        }

        info!(
            "Parsing strategy registered: {}{}",
            name,
            if is_default { " (default)" } else { "" }
        );
        Ok(())
    }

    /// Highest `confidence_for` among supporting strategies; ties keep the
    /// earlier registration. Falls back to the default when nothing scores above 0.
    pub fn find_best(&self, url: &str, content_type: &str) -> Option<Arc<dyn ParsingStrategy>> {
        let set = read(&self.inner);

        let mut best: Option<&Arc<dyn ParsingStrategy>> = None;
        let mut highest = 0u8;
        for strategy in &set.entries {
            if !strategy.supports(url, content_type) {
                continue;
            }
            let confidence = strategy.confidence_for(url);
            if confidence > highest {
                highest = confidence;
                best = Some(strategy);
            }
        }

        match best {
            Some(strategy) => {
                debug!("Selected strategy {} (confidence {})", strategy.name(), highest);
                Some(Arc::clone(strategy))
            }
            None => {
                debug!("No strategy scored above 0 for {}, using default", url);
                set.default.clone()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ParsingStrategy>> {
        read(&self.inner)
            .entries
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    pub fn default_strategy(&self) -> Option<Arc<dyn ParsingStrategy>> {
        read(&self.inner).default.clone()
    }

    pub fn set_default(&self, name: &str) -> Result<(), ParseError> {
        let strategy = self
            .get(name)
            .ok_or_else(|| ParseError::Configuration(format!("Strategy not found: {name}")))?;
        write(&self.inner).default = Some(strategy);
        info!("Default parsing strategy set to: {}", name);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        read(&self.inner)
            .entries
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        read(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named content extractors in registration order.
#[derive(Default)]
pub struct ExtractorRegistry {
    entries: RwLock<Vec<Arc<dyn ContentExtractor>>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, extractor: Arc<dyn ContentExtractor>) -> Result<(), ParseError> {
        let name = checked_name(extractor.name(), "content extractor")?;
        let mut entries = write(&self.entries);

        match entries.iter().position(|e| e.name() == name) {
            Some(index) => entries[index] = extractor,
            None => entries.push(extractor),
        }

        info!("Content extractor registered: {}", name);
        Ok(())
    }

    /// Lowest priority among extractors that can handle `url`; ties keep the
    /// earlier registration.
    pub fn find_best(&self, url: &str) -> Option<Arc<dyn ContentExtractor>> {
        let entries = read(&self.entries);

        let mut best: Option<&Arc<dyn ContentExtractor>> = None;
        for extractor in entries.iter().filter(|e| e.can_handle(url)) {
            if best.is_none_or(|current| extractor.priority() < current.priority()) {
                best = Some(extractor);
            }
        }

        best.cloned()
    }

    pub fn names(&self) -> Vec<String> {
        read(&self.entries)
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{ExtractedContent, ParsedContent};
    use crate::fetcher::FetchOptions;
    use async_trait::async_trait;

    struct FixedStrategy {
        name: &'static str,
        confidence: u8,
        supported: bool,
    }

    fn strategy(name: &'static str, confidence: u8) -> Arc<dyn ParsingStrategy> {
        Arc::new(FixedStrategy {
            name,
            confidence,
            supported: true,
        })
    }

    #[async_trait]
    impl ParsingStrategy for FixedStrategy {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, _url: &str, _content_type: &str) -> bool {
            self.supported
        }

        fn confidence_for(&self, _url: &str) -> u8 {
            self.confidence
        }

        async fn parse(&self, url: &str, _options: &FetchOptions) -> Result<ParsedContent, ParseError> {
            Ok(ParsedContent::new(url))
        }
    }

    struct FixedExtractor {
        name: &'static str,
        priority: u32,
        handles: bool,
    }

    fn extractor(name: &'static str, priority: u32, handles: bool) -> Arc<dyn ContentExtractor> {
        Arc::new(FixedExtractor {
            name,
            priority,
            handles,
        })
    }

    #[async_trait]
    impl ContentExtractor for FixedExtractor {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn can_handle(&self, _url: &str) -> bool {
            self.handles
        }

        async fn extract(
            &self,
            url: &str,
            _options: &FetchOptions,
        ) -> Result<ExtractedContent, ParseError> {
            Ok(ParsedContent::new(url).into_extracted())
        }
    }

    const URL: &str = "https://example.com";

    #[test]
    fn test_highest_confidence_wins() {
        let registry = StrategyRegistry::new();
        registry.register(strategy("a", 70), false).unwrap();
        registry.register(strategy("b", 90), false).unwrap();

        assert_eq!(registry.find_best(URL, "").unwrap().name(), "b");
    }

    #[test]
    fn test_confidence_tie_keeps_first_registered() {
        let registry = StrategyRegistry::new();
        registry.register(strategy("first", 80), false).unwrap();
        registry.register(strategy("second", 80), false).unwrap();

        assert_eq!(registry.find_best(URL, "").unwrap().name(), "first");
    }

    #[test]
    fn test_zero_confidence_falls_back_to_default() {
        let registry = StrategyRegistry::new();
        registry.register(strategy("zero", 0), false).unwrap();
        registry.register(strategy("fallback", 0), true).unwrap();

        assert_eq!(registry.find_best(URL, "").unwrap().name(), "fallback");
    }

    #[test]
    fn test_unsupported_falls_back_to_first_registered() {
        let registry = StrategyRegistry::new();
        registry
            .register(
                Arc::new(FixedStrategy {
                    name: "picky",
                    confidence: 90,
                    supported: false,
                }),
                false,
            )
            .unwrap();
        registry.register(strategy("other", 0), false).unwrap();

        assert_eq!(registry.find_best(URL, "").unwrap().name(), "picky");
    }

    #[test]
    fn test_empty_registry_selects_nothing() {
        let registry = StrategyRegistry::new();
        assert!(registry.find_best(URL, "").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregistration_overwrites_in_place() {
        let registry = StrategyRegistry::new();
        registry.register(strategy("a", 10), false).unwrap();
        registry.register(strategy("b", 20), false).unwrap();
        registry.register(strategy("a", 95), false).unwrap();

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().confidence_for(URL), 95);
        assert_eq!(registry.default_strategy().unwrap().confidence_for(URL), 95);
    }

    #[test]
    fn test_empty_name_is_configuration_error() {
        let registry = StrategyRegistry::new();
        let result = registry.register(strategy("", 50), false);
        assert!(matches!(result, Err(ParseError::Configuration(_))));

        let extractors = ExtractorRegistry::new();
        let result = extractors.register(extractor(" ", 1, true));
        assert!(matches!(result, Err(ParseError::Configuration(_))));
    }

    #[test]
    fn test_set_default() {
        let registry = StrategyRegistry::new();
        registry.register(strategy("a", 10), false).unwrap();
        registry.register(strategy("b", 10), false).unwrap();
        assert_eq!(registry.default_strategy().unwrap().name(), "a");

        registry.set_default("b").unwrap();
        assert_eq!(registry.default_strategy().unwrap().name(), "b");
        assert!(matches!(
            registry.set_default("missing"),
            Err(ParseError::Configuration(_))
        ));
    }

    #[test]
    fn test_lowest_priority_extractor_wins() {
        let registry = ExtractorRegistry::new();
        registry.register(extractor("base", 100, true)).unwrap();
        registry.register(extractor("domain", 50, true)).unwrap();
        registry.register(extractor("skipped", 1, false)).unwrap();

        assert_eq!(registry.find_best(URL).unwrap().name(), "domain");
    }

    #[test]
    fn test_extractor_priority_tie_keeps_first() {
        let registry = ExtractorRegistry::new();
        registry.register(extractor("one", 10, true)).unwrap();
        registry.register(extractor("two", 10, true)).unwrap();

        assert_eq!(registry.find_best(URL).unwrap().name(), "one");
        assert_eq!(registry.names(), vec!["one", "two"]);
    }

    #[test]
    fn test_no_extractor_handles_url() {
        let registry = ExtractorRegistry::new();
        registry.register(extractor("none", 10, false)).unwrap();
        assert!(registry.find_best("https://unsupported.test").is_none());
    }
}
