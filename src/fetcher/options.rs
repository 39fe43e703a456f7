use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::config::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};

pub const MAX_DELAY_MS: u64 = 10_000;

/// Lifecycle point at which a rendered page counts as loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum WaitUntil {
    /// The `load` event fired.
    #[default]
    #[serde(rename = "load")]
    Load,
    /// `DOMContentLoaded` fired.
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// No new network activity for the idle window.
    #[serde(rename = "networkidle0")]
    NetworkIdle0,
    /// At most two new requests during the idle window.
    #[serde(rename = "networkidle2")]
    NetworkIdle2,
}

/// Per-request knobs for fetching and rendering a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchOptions {
    /// Force a registered strategy instead of running selection.
    pub strategy: Option<String>,
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    pub wait_until: WaitUntil,
    pub wait_for_selector: Option<String>,
    #[serde(rename = "delay")]
    pub delay_ms: u64,
    pub load_media: bool,
    pub user_agent: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            strategy: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            wait_until: WaitUntil::Load,
            wait_for_selector: None,
            delay_ms: 0,
            load_media: false,
            user_agent: None,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// User agent for this request, falling back to the service default.
    pub fn user_agent_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.user_agent
            .as_deref()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(default)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(format!(
                "\"timeout\" must be between {} and {}",
                MIN_TIMEOUT_MS, MAX_TIMEOUT_MS
            ));
        }
        if self.delay_ms > MAX_DELAY_MS {
            return Err(format!(
                "\"delay\" must be less than or equal to {}",
                MAX_DELAY_MS
            ));
        }
        if let Some(selector) = &self.wait_for_selector
            && selector.trim().is_empty()
        {
            return Err("\"waitForSelector\" is not allowed to be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.timeout(), Duration::from_secs(30));
        assert_eq!(options.wait_until, WaitUntil::Load);
        assert!(!options.load_media);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_timeout_outside_range() {
        assert!(FetchOptions::default().with_timeout_ms(999).validate().is_err());
        assert!(FetchOptions::default().with_timeout_ms(60_001).validate().is_err());
        assert!(FetchOptions::default().with_timeout_ms(1_000).validate().is_ok());
        assert!(FetchOptions::default().with_timeout_ms(60_000).validate().is_ok());
    }

    #[test]
    fn rejects_long_delay() {
        let options = FetchOptions {
            delay_ms: 10_001,
            ..FetchOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.contains("delay"));
    }

    #[test]
    fn wait_until_uses_wire_names() {
        let parsed: WaitUntil = serde_json::from_str("\"networkidle2\"").unwrap();
        assert_eq!(parsed, WaitUntil::NetworkIdle2);
        assert_eq!(
            serde_json::to_string(&WaitUntil::DomContentLoaded).unwrap(),
            "\"domcontentloaded\""
        );
        assert!(serde_json::from_str::<WaitUntil>("\"idle\"").is_err());
    }

    #[test]
    fn user_agent_falls_back_to_default() {
        let mut options = FetchOptions::default();
        assert_eq!(options.user_agent_or("Default/1.0"), "Default/1.0");
        options.user_agent = Some("Custom/2.0".to_string());
        assert_eq!(options.user_agent_or("Default/1.0"), "Custom/2.0");
    }
}
