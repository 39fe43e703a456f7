use url::Url;

use crate::extractor::{compute_confidence, extract};
use crate::parser::ParseError;

fn article_page() -> String {
    let paragraph = "This is the first paragraph of a long article about web content extraction. \
        It explains how pages are fetched, rendered and reduced to their readable core. ";
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Sample Article</title>
  <meta name="author" content="Jane Doe">
  <meta property="article:published_time" content="2024-03-01T09:30:00Z">
  <meta name="description" content="An article about extraction.">
  <meta name="keywords" content="extraction, parsing">
  <style>body {{ color: red; }}</style>
  <script>console.log('tracking');</script>
</head>
<body>
  <nav><a href="/home">Home</a> <a href="/about">About</a></nav>
  <article>
    <h1>Sample Article</h1>
    <p>{p1}</p>
    <p>The second paragraph continues the story. {p2}
       See the <a href="/related">related post</a> for more details.</p>
    <p><img src="/images/sample.jpg" alt="Sample image" title="Sample"></p>
    <p>{p3}</p>
  </article>
  <span class="tag">rust</span>
  <footer>Copyright</footer>
</body>
</html>"#,
        p1 = paragraph.repeat(3),
        p2 = paragraph.repeat(2),
        p3 = paragraph.repeat(3),
    )
}

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

#[test]
fn test_extract_article_fields() {
    let draft = extract(&article_page(), &url("https://example.com/article"), "ko").unwrap();

    assert!(draft.title.contains("Sample Article"));
    assert!(draft.content.contains("first paragraph"));
    assert!(draft.content.contains("second paragraph"));
    assert!(!draft.excerpt.is_empty());
    assert!(draft.excerpt.chars().count() <= 200);
    assert_eq!(draft.author, "Jane Doe");
    assert_eq!(
        draft.publish_date.map(|d| d.to_rfc3339()),
        Some("2024-03-01T09:30:00+00:00".to_string())
    );
    assert_eq!(draft.description, "An article about extraction.");
    assert_eq!(draft.language, "en");
    assert_eq!(draft.tags, vec!["extraction", "parsing", "rust"]);
    assert_eq!(draft.url, "https://example.com/article");
    assert_eq!(draft.confidence, 0);
}

#[test]
fn test_extract_sanitizes_and_resolves_content() {
    let draft = extract(&article_page(), &url("https://example.com/article"), "ko").unwrap();

    assert!(!draft.html_content.contains("<script"));
    assert!(!draft.html_content.contains("<style"));
    assert!(
        draft
            .links
            .iter()
            .any(|link| link == "https://example.com/related")
    );
    assert!(
        draft
            .images
            .iter()
            .any(|image| image.src == "https://example.com/images/sample.jpg")
    );
}

#[test]
fn test_extracted_article_scores_high() {
    let mut draft = extract(&article_page(), &url("https://example.com/article"), "ko").unwrap();
    draft.clean();
    assert_eq!(compute_confidence(&mut draft), 100);
    assert!(draft.is_valid());
}

#[test]
fn test_default_language_when_undeclared() {
    let html = format!(
        "<html><head><title>Plain</title></head><body><article><p>{}</p></article></body></html>",
        "Plain text paragraph with enough words to count as content. ".repeat(10)
    );
    let draft = extract(&html, &url("https://example.com/plain"), "ko").unwrap();
    assert_eq!(draft.language, "ko");
    assert_eq!(draft.author, "");
    assert!(draft.publish_date.is_none());
    assert!(draft.tags.is_empty());
}

#[test]
fn test_empty_page_is_extraction_error() {
    let result = extract(
        "<html><head></head><body></body></html>",
        &url("https://example.com/empty"),
        "ko",
    );
    assert!(matches!(result, Err(ParseError::Extraction(_))));
}

#[test]
fn test_malformed_html() {
    let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";
    // Must not panic; a result, if any, keeps the visible text.
    if let Ok(draft) = extract(html, &url("https://example.com/broken"), "ko") {
        assert!(draft.content.contains("Unclosed tags") || draft.content.contains("More content"));
    }
}
