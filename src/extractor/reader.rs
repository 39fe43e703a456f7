use readability::extractor;
use scraper::{Html, Selector};
use url::Url;

use crate::extractor::model::ReadabilityResult;

const EXCERPT_MAX_CHARS: usize = 200;
const MIN_FALLBACK_TEXT: usize = 100;

/// Separates the main article from page chrome.
///
/// Returns `None` only when neither readability nor the selector fallback finds any text.
pub fn extract(html: &str, url: &Url) -> Option<ReadabilityResult> {
    if let Ok(article) = extractor::extract(&mut html.as_bytes(), url)
        && !article.text.trim().is_empty()
    {
        let title = if article.title.trim().is_empty() {
            extract_title(&Html::parse_document(html)).unwrap_or_default()
        } else {
            article.title
        };
        return Some(ReadabilityResult {
            excerpt: make_excerpt(&article.text),
            title,
            text: article.text,
            html: article.content,
        });
    }

    fallback_extract(html)
}

/// First non-empty paragraph of the text, cut to 200 characters.
pub fn make_excerpt(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .find(|paragraph| !paragraph.is_empty())
        .map(|paragraph| paragraph.chars().take(EXCERPT_MAX_CHARS).collect())
        .unwrap_or_default()
}

fn fallback_extract(html: &str) -> Option<ReadabilityResult> {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_default();
    let (text, html_content) = extract_main_content(&document);

    if text.trim().is_empty() {
        return None;
    }

    Some(ReadabilityResult {
        excerpt: make_excerpt(&text),
        title,
        text,
        html: html_content,
    })
}

fn extract_title(document: &Html) -> Option<String> {
    if let Ok(selector) = Selector::parse("meta[property='og:title']") {
        for element in document.select(&selector) {
            if let Some(content) = element.value().attr("content")
                && !content.trim().is_empty()
            {
                return Some(content.trim().to_string());
            }
        }
    }

    for tag in ["title", "h1"] {
        if let Ok(selector) = Selector::parse(tag) {
            for element in document.select(&selector) {
                let title = element.text().collect::<String>().trim().to_string();
                if !title.is_empty() {
                    return Some(title);
                }
            }
        }
    }

    None
}

fn extract_main_content(document: &Html) -> (String, String) {
    let content_selectors = [
        "article",
        "main",
        "[role='main']",
        ".content",
        ".post",
        ".article",
        "#content",
        "#main",
        ".entry-content",
    ];

    for selector_str in content_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let text = element.text().collect::<String>();
                if text.trim().chars().count() > MIN_FALLBACK_TEXT {
                    return (text, element.html());
                }
            }
        }
    }

    if let Ok(body_selector) = Selector::parse("body")
        && let Some(body) = document.select(&body_selector).next()
    {
        return (body.text().collect::<String>(), body.html());
    }

    (String::new(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_takes_first_paragraph() {
        let text = "\n\n  First paragraph here.  \nSecond paragraph.";
        assert_eq!(make_excerpt(text), "First paragraph here.");
        assert_eq!(make_excerpt(&"a".repeat(500)).chars().count(), 200);
        assert_eq!(make_excerpt("   "), "");
    }

    #[test]
    fn test_fallback_prefers_article_element() {
        let html = format!(
            "<html><head><title>Fallback</title></head><body><nav>menu</nav><article>{}</article></body></html>",
            "Body text that is long enough. ".repeat(10)
        );
        let result = fallback_extract(&html).unwrap();
        assert_eq!(result.title, "Fallback");
        assert!(result.text.contains("Body text"));
        assert!(!result.text.contains("menu"));
        assert!(result.html.starts_with("<article>"));
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let url = Url::parse("https://example.com/").unwrap();
        assert!(extract("<html><head></head><body>   </body></html>", &url).is_none());
    }
}
