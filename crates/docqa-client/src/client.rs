//! HTTP client for the document QA backend.
//!
//! `DocumentApi` abstracts the three user-facing calls (plus a health probe)
//! so front ends can be driven by a mock in tests.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{ApiErrorResponse, AskResponse, HealthResponse, UploadResponse};

/// Streamed response body.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Operations offered by the backend.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Upload a document as multipart field `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the request fails, or the
    /// backend answers with a non-success status.
    async fn upload(&self, path: &Path) -> Result<UploadResponse>;

    /// Open the summary stream for a previously uploaded file.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not OK.
    async fn summary_stream(&self, file_name: &str) -> Result<ByteStream>;

    /// Ask a question about the uploaded document.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::EmptyInput` for a blank query without sending
    /// anything, or an error if the request fails.
    async fn ask(&self, query: &str) -> Result<AskResponse>;

    /// Probe the backend's health route.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    async fn health(&self) -> Result<String>;
}

/// Route URLs, resolved once from the configuration.
#[derive(Debug, Clone)]
struct Endpoints {
    upload: Url,
    summary: Url,
    ask: Url,
    health: Url,
}

impl Endpoints {
    fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            upload: config.endpoint("upload")?,
            summary: config.endpoint("summary")?,
            ask: config.endpoint("ask")?,
            health: config.health_endpoint()?,
        })
    }
}

/// `DocumentApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentClient {
    client: Client,
    endpoints: Endpoints,
}

impl HttpDocumentClient {
    /// Create a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is unusable, or
    /// `ClientError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoints = Endpoints::new(config)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, endpoints })
    }

    /// Turn a non-success response into `ClientError::Http`.
    async fn handle_error(response: Response) -> ClientError {
        let status = response.status();
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(body) => body.message(),
            Err(_) => None,
        }
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        ClientError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentClient {
    async fn upload(&self, path: &Path) -> Result<UploadResponse> {
        let url = &self.endpoints.upload;
        let file_name = file_name_of(path)?;

        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(url = %url, file = %file_name, bytes = bytes.len(), "uploading document");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn summary_stream(&self, file_name: &str) -> Result<ByteStream> {
        let url = &self.endpoints.summary;
        tracing::debug!(url = %url, file = %file_name, "requesting summary stream");

        let response = self
            .client
            .get(url.clone())
            .query(&[("file_path", file_name)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let body = response
            .bytes_stream()
            .map_ok(|bytes| bytes.to_vec())
            .map_err(ClientError::Network);
        Ok(body.boxed())
    }

    async fn ask(&self, query: &str) -> Result<AskResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::EmptyInput("Please enter a message."));
        }

        let url = &self.endpoints.ask;
        tracing::debug!(url = %url, chars = query.len(), "asking question");

        let response = self
            .client
            .post(url.clone())
            .form(&[("query", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn health(&self) -> Result<String> {
        let response = self
            .client
            .get(self.endpoints.health.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let body: HealthResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Ok(body.status)
    }
}

/// File name sent with an upload.
///
/// # Errors
///
/// Returns `ClientError::EmptyInput` if the path has no file name component.
pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .ok_or(ClientError::EmptyInput("Please select a file to upload."))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn file_name_from_path() {
        let path = PathBuf::from("/home/me/docs/notes.pdf");
        assert_eq!(file_name_of(&path).unwrap(), "notes.pdf");
    }

    #[test]
    fn unusable_base_url_is_rejected_up_front() {
        let config = ClientConfig {
            base_url: "http://host?x=1".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HttpDocumentClient::new(&config),
            Err(ClientError::Config(ConfigError::InvalidBaseUrl { .. }))
        ));
    }

    #[test]
    fn endpoints_follow_prefix() {
        let config = ClientConfig {
            api_prefix: "/api".to_string(),
            ..ClientConfig::default()
        };
        let client = HttpDocumentClient::new(&config).unwrap();
        assert_eq!(
            client.endpoints.summary.as_str(),
            "http://127.0.0.1:8000/api/summary/"
        );
        assert_eq!(client.endpoints.health.as_str(), "http://127.0.0.1:8000/health");
    }

    #[test]
    fn file_name_missing() {
        assert!(matches!(
            file_name_of(Path::new("/")),
            Err(ClientError::EmptyInput(_))
        ));
        assert!(matches!(
            file_name_of(Path::new("")),
            Err(ClientError::EmptyInput(_))
        ));
    }
}
