use std::sync::Arc;
use tracing::info;

use crate::config::{Config, RenderingMode};
use crate::fetcher::{ChromiumRenderer, DisabledRenderer, Fetcher, PageRenderer};
use crate::parser::extractors::BaseExtractor;
use crate::parser::manager::ParserManager;
use crate::parser::ParseError;
use crate::parser::readability::ReadabilityStrategy;

/// Builds a ready-to-use [`ParserManager`] from configuration.
pub struct ParserFactory {
    config: Config,
    fetcher: Arc<Fetcher>,
}

impl ParserFactory {
    pub fn new(config: Config) -> Self {
        let renderer: Arc<dyn PageRenderer> = match config.rendering() {
            RenderingMode::Chromium => Arc::new(ChromiumRenderer::new(config.chrome_path().cloned())),
            RenderingMode::Disabled => Arc::new(DisabledRenderer),
        };
        let fetcher = Arc::new(Fetcher::new(renderer, config.user_agent()));
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<Fetcher>) -> Self {
        Self { config, fetcher }
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    /// Registers the readability strategy as default and the generic
    /// extractor at priority 100.
    pub fn initialize(&self) -> Result<ParserManager, ParseError> {
        info!(
            "Initializing parser (renderer: {})",
            self.fetcher.renderer_name()
        );
        let manager = ParserManager::new();

        let readability = ReadabilityStrategy::new(
            Arc::clone(&self.fetcher),
            self.config.default_language(),
        );
        manager.register_strategy(Arc::new(readability), true)?;
        manager.register_extractor(Arc::new(self.create_base_extractor(&manager)))?;

        let status = manager.status();
        info!(
            strategies = ?status.strategies,
            extractors = ?status.extractors,
            "Parser initialization completed"
        );
        Ok(manager)
    }

    pub fn create_base_extractor(&self, manager: &ParserManager) -> BaseExtractor {
        BaseExtractor::new(
            Arc::clone(manager.strategies()),
            Arc::clone(&self.fetcher),
            &self.config,
        )
    }

    /// Generic extractor limited to `domain`, named `<domain>-extractor`.
    pub fn create_domain_extractor(
        &self,
        manager: &ParserManager,
        domain: &str,
        priority: Option<u32>,
    ) -> BaseExtractor {
        self.create_base_extractor(manager).for_domain(domain, priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ParsedContent;
    use crate::parser::ContentExtractor;
    use crate::parser::custom::{CustomStrategy, parse_fn};
    use futures::FutureExt;

    fn factory() -> ParserFactory {
        ParserFactory::new(Config::default().with_rendering(RenderingMode::Disabled))
    }

    #[test]
    fn test_initialize_registers_defaults() {
        let factory = factory();
        let manager = factory.initialize().unwrap();

        assert_eq!(factory.fetcher().renderer_name(), "disabled");
        assert_eq!(manager.strategy_names(), vec!["readability"]);
        assert_eq!(manager.extractor_names(), vec!["base"]);
        assert_eq!(
            manager.strategies().default_strategy().unwrap().name(),
            "readability"
        );
        assert!(manager.status().initialized);
    }

    #[test]
    fn test_domain_extractor_outranks_base() {
        let factory = factory();
        let manager = factory.initialize().unwrap();
        let medium = factory.create_domain_extractor(&manager, "medium.com", None);
        manager.register_extractor(Arc::new(medium)).unwrap();

        let chosen = manager.find_best_extractor("https://medium.com/@a/b").unwrap();
        assert_eq!(chosen.name(), "medium.com-extractor");
        assert_eq!(chosen.priority(), 50);

        let chosen = manager.find_best_extractor("https://example.com/").unwrap();
        assert_eq!(chosen.name(), "base");
    }

    #[tokio::test]
    async fn test_custom_strategy_takes_over_matching_urls() {
        let manager = factory().initialize().unwrap();
        let custom = CustomStrategy::new(
            "video",
            parse_fn(|url, _options| {
                async move {
                    let mut draft = ParsedContent::new(url);
                    draft.title = "Video page title".into();
                    draft.content = "Transcript text ".repeat(40);
                    Ok(draft)
                }
                .boxed()
            }),
        )
        .with_url_patterns(["videos.test"])
        .with_confidence(95);
        manager.register_strategy(Arc::new(custom), false).unwrap();

        let selected = manager
            .find_best_strategy("https://videos.test/watch", "text/html")
            .unwrap();
        assert_eq!(selected.name(), "video");
        let selected = manager
            .find_best_strategy("https://example.com/", "text/html")
            .unwrap();
        assert_eq!(selected.name(), "readability");

        let draft = manager
            .parse_content("https://videos.test/watch", "", &Default::default())
            .await
            .unwrap();
        assert_eq!(draft.parsing_strategy, "video");
        assert!(draft.is_valid());
    }
}
