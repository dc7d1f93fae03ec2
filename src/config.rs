use anyhow::{Context, Result};
use std::env;
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "it-IT";
pub const DEFAULT_PORT: u16 = 5055;

/// Printed in place of the API key by `Debug` impls.
pub const REDACTED: &str = "<redacted>";

/// Process-wide configuration, read once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub language: String,
    pub port: u16,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("port", &self.port)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let api_key = non_empty_var("TMDB_API_KEY");
        let base_url = non_empty_var("TMDB_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let language =
            non_empty_var("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let port = match non_empty_var("ACTION_SERVER_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("ACTION_SERVER_PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            api_key,
            base_url,
            language,
            port,
        })
    }

    /// Builder-style override used by tests and the debugging binary.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Watch-provider region derived from the locale (`it-IT` -> `IT`).
    pub fn region(&self) -> String {
        region_from_language(&self.language)
    }
}

pub fn region_from_language(language: &str) -> String {
    language
        .split(|c: char| c == '-' || c == '_')
        .nth(1)
        .filter(|r| !r.is_empty())
        .unwrap_or(language)
        .to_ascii_uppercase()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
