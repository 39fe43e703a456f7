use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use utoipa::ToSchema;

/// Drafts at or below this confidence are treated as failed extractions.
pub const MIN_CONFIDENCE: u8 = 30;

static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid inline whitespace regex"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n ?").expect("valid newline regex"));
static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line regex"));

pub type Metadata = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    pub title: String,
}

impl ImageRef {
    fn trim(&mut self) {
        self.src = self.src.trim().to_string();
        self.alt = self.alt.trim().to_string();
        self.title = self.title.trim().to_string();
    }
}

/// Output of the content-boundary step: the main article separated from page chrome.
#[derive(Debug)]
pub struct ReadabilityResult {
    pub title: String,
    pub text: String,
    pub html: String,
    pub excerpt: String,
}

/// Intermediate record produced by a parsing strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedContent {
    pub title: String,
    pub content: String,
    pub html_content: String,
    pub author: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub url: String,
    pub description: String,
    pub excerpt: String,
    pub language: String,
    pub tags: Vec<String>,
    pub images: Vec<ImageRef>,
    pub links: Vec<String>,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    pub parsing_strategy: String,
    /// Milliseconds spent producing this record.
    pub parsing_time: u64,
    /// Only meaningful once `compute_confidence` has run.
    pub confidence: u8,
    pub parsed_at: DateTime<Utc>,
}

impl ParsedContent {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            html_content: String::new(),
            author: String::new(),
            publish_date: None,
            url: url.into(),
            description: String::new(),
            excerpt: String::new(),
            language: String::new(),
            tags: Vec::new(),
            images: Vec::new(),
            links: Vec::new(),
            metadata: Metadata::new(),
            parsing_strategy: String::new(),
            parsing_time: 0,
            confidence: 0,
            parsed_at: Utc::now(),
        }
    }

    /// Title and body present and confidence above [`MIN_CONFIDENCE`].
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.content.trim().is_empty()
            && self.confidence > MIN_CONFIDENCE
    }

    /// Trims every text field, normalizes body whitespace, drops empty tags and
    /// duplicate links. Running it twice changes nothing.
    pub fn clean(&mut self) {
        self.title = self.title.trim().to_string();
        self.url = self.url.trim().to_string();
        self.content = normalize_whitespace(&self.content);
        self.description = self.description.trim().to_string();
        self.author = self.author.trim().to_string();
        self.excerpt = self.excerpt.trim().to_string();
        self.language = self.language.trim().to_string();
        self.parsing_strategy = self.parsing_strategy.trim().to_string();
        for image in &mut self.images {
            image.trim();
        }
        self.tags = unique_non_empty(self.tags.drain(..));
        self.links = unique_non_empty(self.links.drain(..));
    }

    pub fn into_extracted(self) -> ExtractedContent {
        let mut metadata = self.metadata;
        metadata.insert("parsingStrategy".into(), Value::from(self.parsing_strategy));
        metadata.insert("parsingTime".into(), Value::from(self.parsing_time));
        metadata.insert("confidence".into(), Value::from(self.confidence));
        metadata.insert("parsedAt".into(), Value::from(self.parsed_at.to_rfc3339()));

        ExtractedContent {
            title: self.title,
            content: self.content,
            author: self.author,
            publish_date: self.publish_date,
            url: self.url,
            description: self.description,
            language: self.language,
            tags: self.tags,
            reading_time: 0,
            word_count: 0,
            images: self.images,
            metadata,
            extracted_at: Utc::now(),
        }
    }
}

/// Final record returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
    pub author: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub url: String,
    pub description: String,
    pub language: String,
    pub tags: Vec<String>,
    /// Minutes, rounded up.
    pub reading_time: u32,
    pub word_count: u32,
    pub images: Vec<ImageRef>,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedContent {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    /// Updates `word_count` and `reading_time` from the body text.
    pub fn calculate_reading_time(&mut self, words_per_minute: u32) -> u32 {
        let words = self.content.split_whitespace().count() as u32;
        self.word_count = words;
        self.reading_time = if words == 0 || words_per_minute == 0 {
            0
        } else {
            words.div_ceil(words_per_minute)
        };
        self.reading_time
    }
}

/// Collapses inline whitespace to single spaces and blank-line runs to one blank line.
pub fn normalize_whitespace(text: &str) -> String {
    let spaced = INLINE_WHITESPACE.replace_all(text, " ");
    let lines = SPACE_AROUND_NEWLINE.replace_all(&spaced, "\n");
    BLANK_LINE_RUNS
        .replace_all(&lines, "\n\n")
        .trim()
        .to_string()
}

fn unique_non_empty(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
