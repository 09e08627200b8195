//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from `.env`.

use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variables checked for the provider key, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone)]
pub struct Settings {
    /// Explicit key; when `None` the key is read from the environment per call
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Load settings after applying `.env` (if present)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let model = env::var("GEMINI_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = env::var("GEMINI_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let port = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            api_key: None,
            model,
            base_url,
            timeout,
            port,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Read the provider key from the environment at call time
pub fn api_key_from_env() -> Option<String> {
    api_key_with(|name| env::var(name).ok())
}

/// First non-blank key among [`API_KEY_VARS`], as reported by `lookup`
pub fn api_key_with(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.port, 8080);
        assert!(settings.api_key.is_none());
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let settings = Settings::default()
            .with_api_key("abc")
            .with_model("gemini-2.0-flash");
        assert_eq!(settings.api_key.as_deref(), Some("abc"));
        assert_eq!(settings.model, "gemini-2.0-flash");
    }
}
