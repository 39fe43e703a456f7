//! Headless-browser rendering for the primary fetch path.
//!
//! Every call to [`PageRenderer::render`] owns an isolated browser session
//! for its whole duration. Sessions are never pooled; the session is closed
//! and its profile directory removed on every exit path.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, EventResponseReceived, ResourceType, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use chromiumoxide::page::Page;
use futures::{FutureExt, StreamExt};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

#[cfg(test)]
use mockall::automock;

use crate::fetcher::options::{FetchOptions, WaitUntil};

/// How long `waitForSelector` may wait before it is abandoned with a warning.
pub const SELECTOR_TIMEOUT: Duration = Duration::from_millis(5_000);
const IDLE_WINDOW: Duration = Duration::from_millis(500);
const IDLE_POLL: Duration = Duration::from_millis(100);
const LOOSE_IDLE_BUDGET: u64 = 2;

const BLOCKED_RESOURCES: [ResourceType; 4] = [
    ResourceType::Image,
    ResourceType::Stylesheet,
    ResourceType::Font,
    ResourceType::Media,
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("rendering disabled")]
    Disabled,

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation timed out after {0}ms")]
    Timeout(u64),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("document returned status {0}")]
    Status(i64),

    #[error("document is not html: {0}")]
    UnsupportedContentType(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

impl From<chromiumoxide::error::CdpError> for RenderError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Protocol(err.to_string())
    }
}

/// Serialized markup of a rendered page and the location it ended up at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

/// Renders a URL and returns its serialized markup.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `url` honoring the wait, selector, delay and media options.
    async fn render(&self, url: &str, options: &FetchOptions) -> Result<RenderedPage, RenderError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Renderer used when browser rendering is switched off; always fails so the
/// fetcher goes straight to its HTTP fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRenderer;

#[async_trait]
impl PageRenderer for DisabledRenderer {
    async fn render(
        &self,
        _url: &str,
        _options: &FetchOptions,
    ) -> Result<RenderedPage, RenderError> {
        Err(RenderError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Chromium renderer driven over the DevTools protocol.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
}

impl ChromiumRenderer {
    /// `executable` of `None` lets chromiumoxide locate an installed browser.
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    #[instrument(skip_all, fields(url = %url))]
    async fn render(&self, url: &str, options: &FetchOptions) -> Result<RenderedPage, RenderError> {
        let mut session = RenderSession::launch(self.executable.as_ref(), options).await?;
        let result = session.load(url, options).await;
        session.close().await;
        result
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// One browser process plus the tasks that drive it.
///
/// [`RenderSession::close`] is the normal teardown. A session dropped without
/// it (the request future was cancelled) aborts its tasks and kills the
/// browser in the background, and the profile directory goes with it.
struct RenderSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    interceptor: Option<JoinHandle<()>>,
    profile: Option<TempDir>,
}

impl RenderSession {
    async fn launch(
        executable: Option<&PathBuf>,
        options: &FetchOptions,
    ) -> Result<Self, RenderError> {
        let profile = tempfile::Builder::new()
            .prefix("linkparse-")
            .tempdir()
            .map_err(|e| RenderError::Launch(format!("browser profile: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .request_timeout(options.timeout())
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let mut session = Self {
            browser: Some(browser),
            page: None,
            handler,
            interceptor: None,
            profile: Some(profile),
        };

        match session.open_page(options).await {
            Ok(()) => Ok(session),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    async fn open_page(&mut self, options: &FetchOptions) -> Result<(), RenderError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Protocol("browser closed".to_string()))?;
        let page = browser.new_page("about:blank").await?;

        if let Some(user_agent) = options.user_agent.as_deref() {
            page.set_user_agent(SetUserAgentOverrideParams::new(user_agent))
                .await?;
        }

        if !options.load_media {
            self.interceptor = Some(block_media(&page).await?);
        }

        self.page = Some(page);
        Ok(())
    }

    async fn load(&self, url: &str, options: &FetchOptions) -> Result<RenderedPage, RenderError> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| RenderError::Protocol("page not open".to_string()))?;
        let started = Instant::now();
        let deadline = started + options.timeout();

        let mut responses = page.event_listener::<EventResponseReceived>().await?;
        match tokio::time::timeout(options.timeout(), navigate(page, url, options.wait_until)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(RenderError::Timeout(options.timeout_ms)),
        }

        let main_frame = page.mainframe().await?;
        let mut document = None;
        while let Some(Some(event)) = responses.next().now_or_never() {
            let in_main_frame = main_frame.is_none() || event.frame_id == main_frame;
            if event.r#type == ResourceType::Document && in_main_frame {
                document = Some((event.response.status, event.response.mime_type.clone()));
            }
        }
        if let Some((status, mime_type)) = document {
            check_document(status, &mime_type)?;
        }

        match options.wait_until {
            WaitUntil::Load | WaitUntil::DomContentLoaded => {}
            WaitUntil::NetworkIdle0 => wait_for_network_idle(page, 0, deadline).await,
            WaitUntil::NetworkIdle2 => {
                wait_for_network_idle(page, LOOSE_IDLE_BUDGET, deadline).await
            }
        }

        if let Some(selector) = options.wait_for_selector.as_deref()
            && !wait_for_selector(page, selector).await
        {
            warn!(
                "Selector '{}' not found within {}ms, continuing",
                selector,
                SELECTOR_TIMEOUT.as_millis()
            );
        }

        if options.delay_ms > 0 {
            tokio::time::sleep(options.delay()).await;
        }

        let html = page.content().await?;
        let final_url = page.url().await?.unwrap_or_else(|| url.to_string());
        debug!(
            "Rendered {} ({} bytes) in {}ms",
            final_url,
            html.len(),
            started.elapsed().as_millis()
        );
        Ok(RenderedPage {
            url: final_url,
            html,
        })
    }

    /// Tears the session down. Never fails; problems are logged.
    async fn close(&mut self) {
        if let Some(interceptor) = self.interceptor.take() {
            interceptor.abort();
        }
        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            debug!("Failed to close page: {}", e);
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser session: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser process did not exit cleanly: {}", e);
            }
        }
        self.handler.abort();
        if let Some(profile) = self.profile.take() {
            let path = profile.path().display().to_string();
            if let Err(e) = profile.close() {
                debug!("Failed to remove browser profile {}: {}", path, e);
            }
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        if let Some(interceptor) = self.interceptor.take() {
            interceptor.abort();
        }
        self.handler.abort();

        let Some(mut browser) = self.browser.take() else {
            return;
        };
        warn!("Render session dropped before close, killing browser");
        let profile = self.profile.take();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Some(Err(e)) = browser.kill().await {
                    debug!("Failed to kill browser: {}", e);
                }
                drop(profile);
            });
        }
    }
}

/// Navigates the page and waits for the lifecycle event `wait_until` starts from.
///
/// `domcontentloaded` returns as soon as the DOM is parsed; every other mode
/// waits for the full load before any idle detection.
async fn navigate(page: &Page, url: &str, wait_until: WaitUntil) -> Result<(), RenderError> {
    if wait_until == WaitUntil::DomContentLoaded {
        let mut dom_ready = page.event_listener::<EventDomContentEventFired>().await?;
        let navigated = page.execute(NavigateParams::new(url)).await?;
        if let Some(error) = navigated.result.error_text.clone() {
            return Err(RenderError::Navigation(error));
        }
        dom_ready.next().await;
        return Ok(());
    }

    page.goto(url)
        .await
        .map_err(|e| RenderError::Navigation(e.to_string()))?;
    Ok(())
}

/// Rejects error pages and non-HTML documents so the fetcher falls back to
/// HTTP, whose status and content-type rules then apply.
fn check_document(status: i64, mime_type: &str) -> Result<(), RenderError> {
    if status >= 400 {
        return Err(RenderError::Status(status));
    }
    let mime_type = mime_type.trim().to_ascii_lowercase();
    if !mime_type.is_empty()
        && !mime_type.starts_with("text/html")
        && !mime_type.starts_with("application/xhtml")
    {
        return Err(RenderError::UnsupportedContentType(mime_type));
    }
    Ok(())
}

/// Fails image, stylesheet, font and media requests before they hit the network.
async fn block_media(page: &Page) -> Result<JoinHandle<()>, RenderError> {
    let mut paused = page.event_listener::<EventRequestPaused>().await?;

    let patterns = BLOCKED_RESOURCES.iter().map(|resource| {
        RequestPattern::builder()
            .url_pattern("*")
            .resource_type(resource.clone())
            .request_stage(RequestStage::Request)
            .build()
    });
    page.execute(EnableParams::builder().patterns(patterns).build())
        .await?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let blocked =
                FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if let Err(e) = page.execute(blocked).await {
                debug!("Failed to block request: {}", e);
            }
        }
    }))
}

/// Waits until the number of loaded resources stops growing for the idle window.
async fn wait_for_network_idle(page: &Page, budget: u64, deadline: Instant) {
    let mut baseline = resource_count(page).await;
    let mut quiet_since = Instant::now();

    while Instant::now() < deadline {
        tokio::time::sleep(IDLE_POLL).await;
        let current = resource_count(page).await;
        if current > baseline + budget {
            baseline = current;
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= IDLE_WINDOW {
            return;
        }
    }
    debug!("Network did not settle before the navigation deadline");
}

async fn resource_count(page: &Page) -> u64 {
    match page
        .evaluate("performance.getEntriesByType('resource').length")
        .await
    {
        Ok(result) => result.into_value::<u64>().unwrap_or(0),
        Err(_) => 0,
    }
}

async fn wait_for_selector(page: &Page, selector: &str) -> bool {
    let deadline = Instant::now() + SELECTOR_TIMEOUT;
    while Instant::now() < deadline {
        if page.find_element(selector).await.is_ok() {
            return true;
        }
        tokio::time::sleep(IDLE_POLL).await;
    }
    false
}
