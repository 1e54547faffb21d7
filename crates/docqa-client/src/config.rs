//! Client configuration.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::ConfigError;

/// Configuration for talking to the document QA backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend origin (e.g., "http://127.0.0.1:8000").
    #[serde(default = "ClientConfig::default_base_url")]
    pub base_url: String,

    /// Path prefix in front of the API routes (e.g., "/api").
    #[serde(default)]
    pub api_prefix: String,

    /// Delay between rendered summary blocks, in milliseconds.
    #[serde(default = "ClientConfig::default_pacing_ms")]
    pub pacing_ms: u64,

    /// Optional request timeout in seconds. `None` keeps transport defaults.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    /// Start streaming a summary right after a successful upload.
    #[serde(default)]
    pub auto_summary: bool,
}

impl ClientConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:8000".to_string()
    }

    const fn default_pacing_ms() -> u64 {
        50
    }

    /// Check the base URL and normalize the prefix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the URL does not parse, is not
    /// http(s), has no host, or carries a query or fragment.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let base = self.base()?;
        self.base_url = base.as_str().trim_end_matches('/').to_string();

        let prefix = self.api_prefix.trim().trim_matches('/');
        self.api_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("/{prefix}")
        };
        Ok(self)
    }

    /// Parse the base URL.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::validated`].
    pub fn base(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };

        let url = Url::parse(self.base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }
        if url.query().is_some() {
            return Err(invalid("query strings are not allowed".to_string()));
        }
        if url.fragment().is_some() {
            return Err(invalid("fragments are not allowed".to_string()));
        }
        Ok(url)
    }

    /// Full URL of an API route, e.g. `endpoint("upload")` is
    /// `{base}{prefix}/upload/`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the base URL is unusable.
    pub fn endpoint(&self, route: &str) -> Result<Url, ConfigError> {
        let prefix: Vec<&str> = self.api_prefix.split('/').filter(|s| !s.is_empty()).collect();
        self.join_segments(prefix.into_iter().chain([route, ""]))
    }

    /// URL of the backend's health route, which is not under the prefix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the base URL is unusable.
    pub fn health_endpoint(&self) -> Result<Url, ConfigError> {
        self.join_segments(["health"])
    }

    fn join_segments<'s>(
        &self,
        segments: impl IntoIterator<Item = &'s str>,
    ) -> Result<Url, ConfigError> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|()| ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Get the pacing delay as a `Duration`.
    #[must_use]
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Get the request timeout as a `Duration`, if one is set.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_prefix: String::new(),
            pacing_ms: Self::default_pacing_ms(),
            request_timeout_seconds: None,
            auto_summary: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.pacing(), Duration::from_millis(50));
        assert!(config.request_timeout().is_none());
        assert!(!config.auto_summary);
    }

    #[test]
    fn endpoint_with_prefix() {
        let config = ClientConfig {
            base_url: "http://localhost:8000/".to_string(),
            api_prefix: "api/".to_string(),
            ..ClientConfig::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(
            config.endpoint("upload").unwrap().as_str(),
            "http://localhost:8000/api/upload/"
        );
        assert_eq!(
            config.health_endpoint().unwrap().as_str(),
            "http://localhost:8000/health"
        );
    }

    #[test]
    fn endpoint_without_prefix() {
        let config = ClientConfig::default().validated().unwrap();
        assert_eq!(
            config.endpoint("ask").unwrap().as_str(),
            "http://127.0.0.1:8000/ask/"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let config = ClientConfig {
            base_url: "https://example.com/docqa/".to_string(),
            api_prefix: "/api".to_string(),
            ..ClientConfig::default()
        }
        .validated()
        .unwrap();
        assert_eq!(
            config.endpoint("summary").unwrap().as_str(),
            "https://example.com/docqa/api/summary/"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        for bad in [
            "localhost:8000",
            "http://bad host",
            "http://host?x=1",
            "http://host#frag",
            "http://",
            "ftp://example.com",
            "not a url",
        ] {
            let config = ClientConfig {
                base_url: bad.to_string(),
                ..ClientConfig::default()
            };
            assert!(
                matches!(
                    config.validated(),
                    Err(ConfigError::InvalidBaseUrl { ref url, .. }) if url == bad
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_prefix":"/api","request_timeout_seconds":30}"#).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.pacing_ms, 50);
    }
}
