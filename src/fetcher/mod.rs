pub mod client;
pub mod errors;
pub mod options;
pub mod pipeline;
pub mod renderer;
pub mod types;

pub use client::{build_client, fetch, probe_content_type};
pub use errors::FetchError;
pub use options::{FetchOptions, WaitUntil};
pub use renderer::{ChromiumRenderer, DisabledRenderer, PageRenderer, RenderError, RenderedPage};
pub use types::{Charset, FetchedPage, PageResponse, RequestSettings};

use once_cell::sync::OnceCell;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Acquires raw markup for a URL: browser rendering first, plain HTTP GET on
/// any rendering failure.
pub struct Fetcher {
    renderer: Arc<dyn PageRenderer>,
    http: OnceCell<Client>,
    user_agent: String,
}

impl Fetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>, user_agent: impl Into<String>) -> Self {
        Self {
            renderer,
            http: OnceCell::new(),
            user_agent: user_agent.into(),
        }
    }

    /// Fetcher that never launches a browser.
    pub fn http_only(user_agent: impl Into<String>) -> Self {
        Self::new(Arc::new(DisabledRenderer), user_agent)
    }

    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the HTTP client, building it on first use.
    pub fn http_client(&self) -> Result<&Client, FetchError> {
        self.http.get_or_try_init(build_client)
    }

    /// Fetches `url` and reports where the markup was actually served from.
    #[instrument(skip_all, fields(url = %url, renderer = self.renderer.name()))]
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, FetchError> {
        let requested = Url::parse(url)?;

        match self.renderer.render(url, options).await {
            Ok(page) => {
                debug!("Rendered {} bytes of markup", page.html.len());
                return Ok(FetchedPage {
                    final_url: web_url(&page.url).unwrap_or(requested),
                    markup: page.html,
                });
            }
            Err(RenderError::Disabled) => {}
            Err(e) => warn!("Rendering failed for {}, falling back to HTTP: {}", url, e),
        }

        let settings = RequestSettings::new(options.timeout(), options.user_agent_or(&self.user_agent));
        let page = fetch(self.http_client()?, url, &settings)
            .await
            .inspect_err(|e| {
                warn!(
                    "HTTP fetch failed for {} (retriable: {}): {}",
                    url,
                    e.should_retry(),
                    e
                )
            })?;
        info!(
            "Fetched {} over HTTP (status: {}, charset: {:?}, size: {} bytes)",
            page.url_final,
            page.status,
            page.charset,
            page.body_utf8.len()
        );
        Ok(FetchedPage {
            final_url: page.url_final,
            markup: page.body_utf8,
        })
    }
}

/// The rendered location, when it is an http(s) URL links can resolve against.
fn web_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
