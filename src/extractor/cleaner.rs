use ammonia::Builder;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

static HREF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("valid href regex"));
static SRC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="([^"]+)""#).expect("valid src regex"));

/// Strips scripts, styles and other unsafe markup, then makes relative
/// `href`/`src` targets absolute against `base_url`.
pub fn sanitize_and_resolve_links(html: &str, base_url: &Url) -> String {
    let clean_html = Builder::default().clean(html).to_string();
    resolve_links(&clean_html, base_url)
}

fn resolve_links(html: &str, base_url: &Url) -> String {
    let resolve = |attr: &'static str| {
        move |caps: &Captures| match base_url.join(&caps[1]) {
            Ok(absolute_url) => format!(r#"{}="{}""#, attr, absolute_url),
            Err(_) => caps[0].to_string(),
        }
    };

    let html = HREF_REGEX.replace_all(html, resolve("href"));
    SRC_REGEX.replace_all(&html, resolve("src")).into_owned()
}
