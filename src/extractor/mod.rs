pub mod cleaner;
pub mod fields;
pub mod language;
pub mod model;
pub mod reader;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use model::{ExtractedContent, ImageRef, MIN_CONFIDENCE, Metadata, ParsedContent};
pub use scoring::{compute_confidence, quality_score};

use scraper::Html;
use url::Url;

use crate::parser::ParseError;

/// Turns rendered markup into a draft article.
///
/// Only the content boundary can fail; every heuristic field degrades to
/// empty when its selectors find nothing.
pub fn extract(markup: &str, url: &Url, default_language: &str) -> Result<ParsedContent, ParseError> {
    let article = reader::extract(markup, url).ok_or_else(|| {
        ParseError::Extraction(format!("no readable content found at {url}"))
    })?;

    let content_html = cleaner::sanitize_and_resolve_links(&article.html, url);
    let document = Html::parse_document(markup);

    let mut draft = ParsedContent::new(url.as_str());
    draft.title = article.title;
    draft.content = article.text;
    draft.excerpt = article.excerpt;
    draft.author = fields::extract_author(&document);
    draft.publish_date = fields::extract_publish_date(&document);
    draft.description = fields::extract_description(&document);
    draft.language = fields::extract_language(&document, default_language);
    draft.tags = fields::extract_tags(&document);
    draft.images = fields::extract_images(&content_html);
    draft.links = fields::extract_links(&content_html);
    draft.html_content = content_html;

    Ok(draft)
}
