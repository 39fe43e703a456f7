use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::extractor::language::detect_language_or;
use crate::extractor::{ExtractedContent, quality_score};
use crate::fetcher::{FetchOptions, Fetcher, RequestSettings, probe_content_type};
use crate::parser::manager::parse_with;
use crate::parser::registry::StrategyRegistry;
use crate::parser::strategy::{DEFAULT_EXTRACTOR_PRIORITY, is_web_url};
use crate::parser::{ContentExtractor, ParseError};

pub const BASE_EXTRACTOR: &str = "base";
pub const DOMAIN_EXTRACTOR_PRIORITY: u32 = 50;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const DESCRIPTION_MAX_CHARS: usize = 200;

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static TITLE_SITE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|•·].*$").expect("valid title suffix regex"));
static SENTENCE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));

/// Generic extractor: strategy selection plus post-processing into a final record.
///
/// Restricting it to a set of domains turns it into a domain-specific extractor.
#[derive(Clone)]
pub struct BaseExtractor {
    name: String,
    priority: u32,
    supported_domains: Vec<String>,
    strategies: Arc<StrategyRegistry>,
    fetcher: Arc<Fetcher>,
    words_per_minute: u32,
    default_language: String,
}

impl BaseExtractor {
    pub fn new(strategies: Arc<StrategyRegistry>, fetcher: Arc<Fetcher>, config: &Config) -> Self {
        Self {
            name: BASE_EXTRACTOR.to_string(),
            priority: DEFAULT_EXTRACTOR_PRIORITY,
            supported_domains: Vec::new(),
            strategies,
            fetcher,
            words_per_minute: config.words_per_minute(),
            default_language: config.default_language().to_string(),
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Copy of this extractor limited to URLs containing `domain`, named
    /// `<domain>-extractor`. Priority defaults to 50.
    pub fn for_domain(&self, domain: &str, priority: Option<u32>) -> Self {
        Self {
            name: format!("{domain}-extractor"),
            priority: priority.unwrap_or(DOMAIN_EXTRACTOR_PRIORITY),
            supported_domains: vec![domain.to_string()],
            ..self.clone()
        }
    }

    async fn detect_content_type(&self, url: &str, options: &FetchOptions) -> String {
        let Ok(client) = self.fetcher.http_client() else {
            return "text/html".to_string();
        };
        let settings = RequestSettings::new(
            options.timeout().min(PROBE_TIMEOUT),
            options.user_agent_or(self.fetcher.user_agent()),
        );
        probe_content_type(client, url, &settings).await
    }

    async fn run(&self, url: &str, options: &FetchOptions) -> Result<ExtractedContent, ParseError> {
        if !self.can_handle(url) {
            return Err(ParseError::Unsupported {
                extractor: self.name.clone(),
                url: url.to_string(),
            });
        }

        let content_type = self.detect_content_type(url, options).await;
        let draft = parse_with(&self.strategies, url, &content_type, options).await?;

        let mut content = draft.into_extracted();
        content.calculate_reading_time(self.words_per_minute);
        self.post_process(&mut content);
        Ok(content)
    }

    fn post_process(&self, content: &mut ExtractedContent) {
        content.title = clean_title(&content.title);
        content.content = collapse_whitespace(&content.content);
        if content.description.trim().is_empty() && !content.content.is_empty() {
            content.description = generate_description(&content.content, DESCRIPTION_MAX_CHARS);
        }

        let quality = quality_score(content);
        content
            .metadata
            .insert("qualityScore".into(), Value::from(quality));
        content
            .metadata
            .insert("extractor".into(), Value::from(self.name.clone()));
        content
            .metadata
            .insert("extractorPriority".into(), Value::from(self.priority));

        if content.language.trim().is_empty() {
            content.language = detect_language_or(&content.content, &self.default_language);
        }

        content.title = content.title.trim().to_string();
        content.description = content.description.trim().to_string();
        content.tags.retain(|tag| !tag.trim().is_empty());
    }
}

#[async_trait]
impl ContentExtractor for BaseExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn can_handle(&self, url: &str) -> bool {
        if !is_web_url(url) {
            return false;
        }
        self.supported_domains.is_empty()
            || self
                .supported_domains
                .iter()
                .any(|domain| url.contains(domain.as_str()))
    }

    #[instrument(skip_all, fields(url = %url, extractor = %self.name))]
    async fn extract(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<ExtractedContent, ParseError> {
        let started = Instant::now();
        info!("Starting content extraction with {}", self.name);

        let result = self.run(url, options).await;
        let elapsed = started.elapsed().as_millis();
        match &result {
            Ok(_) => info!("Content extraction completed in {}ms", elapsed),
            Err(e) => error!("Content extraction failed after {}ms: {}", elapsed, e),
        }
        result
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUNS.replace_all(text, " ").trim().to_string()
}

/// Collapses whitespace and drops a trailing site name after `|`, `•` or `·`.
pub fn clean_title(title: &str) -> String {
    let collapsed = collapse_whitespace(title);
    TITLE_SITE_SUFFIX
        .replace(&collapsed, "")
        .trim()
        .to_string()
}

/// Leading sentences of `content` that fit in `max_chars`, ending with a period.
pub fn generate_description(content: &str, max_chars: usize) -> String {
    let mut description = String::new();
    for sentence in SENTENCE_BREAKS.split(content).map(str::trim) {
        if sentence.is_empty() {
            continue;
        }
        if description.chars().count() + sentence.chars().count() > max_chars {
            break;
        }
        if !description.is_empty() {
            description.push_str(". ");
        }
        description.push_str(sentence);
    }

    if !description.is_empty() && !description.ends_with('.') {
        description.push('.');
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderingMode;

    fn base() -> BaseExtractor {
        let config = Config::default().with_rendering(RenderingMode::Disabled);
        BaseExtractor::new(
            Arc::new(StrategyRegistry::new()),
            Arc::new(Fetcher::http_only(config.user_agent())),
            &config,
        )
    }

    #[test]
    fn test_clean_title_strips_site_suffix() {
        assert_eq!(clean_title("  Rust   Tips | My Blog "), "Rust Tips");
        assert_eq!(clean_title("Headline • Daily News"), "Headline");
        assert_eq!(clean_title("A · B"), "A");
        assert_eq!(clean_title("No suffix here"), "No suffix here");
    }

    #[test]
    fn test_generate_description() {
        let text = "First sentence. Second one! Third? ";
        assert_eq!(
            generate_description(text, 200),
            "First sentence. Second one. Third."
        );

        let long = format!("{}. tail", "x".repeat(250));
        assert_eq!(generate_description(&long, 200), "");

        let capped = generate_description(&"word word word. ".repeat(40), 200);
        assert!(capped.chars().count() <= 200 + 2 * 40);
        assert!(capped.ends_with('.'));
    }

    #[test]
    fn test_domain_extractor() {
        let medium = base().for_domain("medium.com", None);
        assert_eq!(medium.name(), "medium.com-extractor");
        assert_eq!(medium.priority(), 50);
        assert!(medium.can_handle("https://medium.com/@a/post"));
        assert!(!medium.can_handle("https://example.com/post"));

        let custom = base().for_domain("dev.to", Some(10));
        assert_eq!(custom.priority(), 10);
    }

    #[test]
    fn test_base_handles_web_urls() {
        let extractor = base();
        assert_eq!(extractor.name(), "base");
        assert_eq!(extractor.priority(), 100);
        assert!(extractor.can_handle("http://example.com"));
        assert!(!extractor.can_handle("mailto:me@example.com"));
    }

    #[test]
    fn test_post_process_fills_derived_fields() {
        let extractor = base();
        let mut draft = crate::extractor::ParsedContent::new("https://example.com");
        draft.title = "Post Title | Site".into();
        draft.content = "This   is the body.\n\nIt has two sentences.".into();
        draft.tags = vec!["news".into(), " ".into()];
        let mut content = draft.into_extracted();

        extractor.post_process(&mut content);

        assert_eq!(content.title, "Post Title");
        assert_eq!(content.content, "This is the body. It has two sentences.");
        assert_eq!(content.description, "This is the body. It has two sentences.");
        assert_eq!(content.language, "ko");
        assert_eq!(content.tags, vec!["news"]);
        assert_eq!(content.metadata["extractor"], "base");
        assert_eq!(content.metadata["extractorPriority"], 100);
        assert!(content.metadata.contains_key("qualityScore"));
    }

    #[tokio::test]
    async fn test_unsupported_url_is_rejected() {
        let extractor = base().for_domain("medium.com", None);
        let err = extractor
            .extract("https://example.com/x", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }
}
