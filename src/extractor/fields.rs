//! Heuristic metadata extraction.
//!
//! Each field has an ordered list of CSS selectors; the first matching element
//! wins. None of these functions fail: a missing field is empty or `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::extractor::model::ImageRef;

const AUTHOR_SELECTORS: [&str; 5] = [
    "meta[name='author']",
    "meta[property='article:author']",
    ".author",
    ".byline",
    "[rel='author']",
];

const DATE_SELECTORS: [&str; 6] = [
    "meta[property='article:published_time']",
    "meta[name='publish_date']",
    "meta[name='date']",
    "time[datetime]",
    ".published",
    ".date",
];

const DESCRIPTION_SELECTORS: [&str; 3] = [
    "meta[name='description']",
    "meta[property='og:description']",
    "meta[name='twitter:description']",
];

const TAG_SELECTORS: &str = ".tag, .tags a, .category";

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn extract_author(document: &Html) -> String {
    AUTHOR_SELECTORS
        .iter()
        .find_map(|selector| first_match(document, selector))
        .map(|element| match element.value().attr("content") {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => element_text(&element),
        })
        .unwrap_or_default()
}

pub fn extract_publish_date(document: &Html) -> Option<DateTime<Utc>> {
    DATE_SELECTORS.iter().find_map(|selector| {
        let element = first_match(document, selector)?;
        let raw = element
            .value()
            .attr("content")
            .filter(|v| !v.is_empty())
            .or_else(|| element.value().attr("datetime").filter(|v| !v.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| element_text(&element));
        parse_date(&raw)
    })
}

pub fn extract_description(document: &Html) -> String {
    DESCRIPTION_SELECTORS
        .iter()
        .find_map(|selector| first_match(document, selector))
        .and_then(|element| element.value().attr("content").map(str::to_string))
        .unwrap_or_default()
}

pub fn extract_language(document: &Html, default_language: &str) -> String {
    let root_lang = document
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty());
    if let Some(lang) = root_lang {
        return lang.to_string();
    }

    first_match(document, "meta[http-equiv='content-language']")
        .and_then(|element| element.value().attr("content"))
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_language.to_string())
}

/// Keywords meta plus tag/category elements, in document order, without duplicates.
pub fn extract_tags(document: &Html) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(keywords) = first_match(document, "meta[name='keywords']")
        .and_then(|element| element.value().attr("content"))
    {
        tags.extend(keywords.split(',').map(|tag| tag.trim().to_string()));
    }

    if let Ok(selector) = Selector::parse(TAG_SELECTORS) {
        tags.extend(
            document
                .select(&selector)
                .map(|element| element_text(&element)),
        );
    }

    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

pub fn extract_images(content_html: &str) -> Vec<ImageRef> {
    if content_html.trim().is_empty() {
        return Vec::new();
    }
    let fragment = Html::parse_fragment(content_html);
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    fragment
        .select(&selector)
        .map(|img| {
            let attr = |name: &str| img.value().attr(name).unwrap_or_default().to_string();
            ImageRef {
                src: attr("src"),
                alt: attr("alt"),
                title: attr("title"),
            }
        })
        .collect()
}

/// Absolute http(s) link targets in the main content.
pub fn extract_links(content_html: &str) -> Vec<String> {
    if content_html.trim().is_empty() {
        return Vec::new();
    }
    let fragment = Html::parse_fragment(content_html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    fragment
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| Url::parse(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
        .collect()
}

/// Parses the date formats commonly found in article metadata.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats_with_tz = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S %z"];
    for fmt in formats_with_tz {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let formats_naive = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y.%m.%d %H:%M",
    ];
    for fmt in formats_naive {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    let formats_date = [
        "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y",
    ];
    for fmt in formats_date {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_author_prefers_meta_content() {
        let document = doc(
            r#"<html><head><meta name="author" content="Jane Doe"></head>
            <body><span class="author">Someone Else</span></body></html>"#,
        );
        assert_eq!(extract_author(&document), "Jane Doe");
    }

    #[test]
    fn test_author_falls_back_to_element_text() {
        let document = doc(r#"<html><body><p class="byline">  By Kim  </p></body></html>"#);
        assert_eq!(extract_author(&document), "By Kim");
        assert_eq!(extract_author(&doc("<html><body></body></html>")), "");
    }

    #[test]
    fn test_publish_date_skips_unparseable_candidates() {
        let document = doc(
            r#"<html><head><meta property="article:published_time" content="not a date"></head>
            <body><time datetime="2024-05-06T07:08:09Z">May 6</time></body></html>"#,
        );
        let date = extract_publish_date(&document).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-05-06T07:08:09+00:00");
    }

    #[test]
    fn test_publish_date_none_when_nothing_parses() {
        let document = doc(r#"<html><body><span class="date">yesterday</span></body></html>"#);
        assert!(extract_publish_date(&document).is_none());
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2024-01-02").is_some());
        assert!(parse_date("Tue, 02 Jan 2024 10:00:00 +0900").is_some());
        assert!(parse_date("January 2, 2024").is_some());
        assert!(parse_date("2024-01-02 10:30:00").is_some());
        assert!(parse_date("").is_none());
        assert!(parse_date("soon").is_none());
    }

    #[test]
    fn test_description_order() {
        let document = doc(
            r#"<html><head>
            <meta property="og:description" content="OG description">
            <meta name="twitter:description" content="Twitter description">
            </head></html>"#,
        );
        assert_eq!(extract_description(&document), "OG description");
    }

    #[test]
    fn test_language_sources() {
        assert_eq!(extract_language(&doc(r#"<html lang="en-US"></html>"#), "ko"), "en-US");
        let meta = doc(
            r#"<html><head><meta http-equiv="content-language" content="fr"></head></html>"#,
        );
        assert_eq!(extract_language(&meta, "ko"), "fr");
        assert_eq!(extract_language(&doc("<html></html>"), "ko"), "ko");
    }

    #[test]
    fn test_tags_union_dedup() {
        let document = doc(
            r#"<html><head><meta name="keywords" content="rust, web, ,parsing"></head>
            <body><a class="tag">rust</a><div class="tags"><a>async</a></div>
            <span class="category">news</span></body></html>"#,
        );
        assert_eq!(
            extract_tags(&document),
            vec!["rust", "web", "parsing", "async", "news"]
        );
    }

    #[test]
    fn test_images_and_links_from_content() {
        let html = r#"<div><img src="https://example.com/a.png" alt="A" title="Pic">
            <img src="https://example.com/b.png">
            <a href="https://example.com/one">one</a>
            <a href="/relative">rel</a>
            <a href="mailto:me@example.com">mail</a>
            <a href="http://other.test/two">two</a></div>"#;

        let images = extract_images(html);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].alt, "A");
        assert_eq!(images[0].title, "Pic");
        assert_eq!(images[1].alt, "");

        assert_eq!(
            extract_links(html),
            vec!["https://example.com/one", "http://other.test/two"]
        );
        assert!(extract_links("").is_empty());
    }
}
