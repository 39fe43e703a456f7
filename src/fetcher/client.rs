use crate::fetcher::{
    errors::FetchError,
    pipeline::process_response,
    types::{PageResponse, RequestSettings},
};
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use tracing::{debug, instrument};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Builds the shared client used by the HTTP fallback path and the content-type probe.
///
/// Timeouts and the User-Agent are applied per request, so one client serves
/// every request regardless of its options.
pub fn build_client() -> Result<Client, FetchError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );

    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(headers)
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}

#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(
    client: &Client,
    url: &str,
    settings: &RequestSettings,
) -> Result<PageResponse, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = client
        .get(parsed_url)
        .timeout(settings.timeout)
        .header(header::USER_AGENT, settings.user_agent.as_str())
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let final_url = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Http {
            status,
            retriable: status.is_server_error(),
        });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let body_bytes = response
        .bytes()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Content-Length may be missing or wrong
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    process_response(final_url, status, body_bytes, &content_type)
}

/// Issues a HEAD request and returns the reported content type.
///
/// Any failure (transport, missing header, non-UTF-8 value) yields `text/html`.
#[instrument(skip_all, fields(url = %url))]
pub async fn probe_content_type(client: &Client, url: &str, settings: &RequestSettings) -> String {
    let response = client
        .head(url)
        .timeout(settings.timeout)
        .header(header::USER_AGENT, settings.user_agent.as_str())
        .send()
        .await;

    match response {
        Ok(response) => response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .filter(|ct| !ct.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        Err(e) => {
            debug!("Failed to detect content type for {}, assuming text/html: {}", url, e);
            DEFAULT_CONTENT_TYPE.to_string()
        }
    }
}
