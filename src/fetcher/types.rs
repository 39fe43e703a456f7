use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    Utf8,
    Windows1252,
    ShiftJis,
    Gb2312,
    Big5,
    EucKr,
    Other(String),
}

impl Charset {
    pub fn from_encoding(encoding: &'static encoding_rs::Encoding) -> Self {
        use std::ptr;

        if ptr::eq(encoding, encoding_rs::UTF_8) {
            Self::Utf8
        } else if ptr::eq(encoding, encoding_rs::WINDOWS_1252) {
            Self::Windows1252
        } else if ptr::eq(encoding, encoding_rs::SHIFT_JIS) {
            Self::ShiftJis
        } else if ptr::eq(encoding, encoding_rs::GBK) || ptr::eq(encoding, encoding_rs::GB18030) {
            Self::Gb2312
        } else if ptr::eq(encoding, encoding_rs::BIG5) {
            Self::Big5
        } else if ptr::eq(encoding, encoding_rs::EUC_KR) {
            Self::EucKr
        } else {
            Self::Other(encoding.name().to_string())
        }
    }
}

/// Raw page as returned by the HTTP fallback path.
#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub body_utf8: String,
    pub charset: Charset,
}

/// Markup together with the URL it was served from after redirects.
///
/// Relative links in `markup` resolve against `final_url`.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub markup: String,
}

/// Settings for a single plain HTTP request.
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl RequestSettings {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }
}
