//! Network capability boundary for the update pipeline.
//!
//! The core never talks to an HTTP stack directly. It consumes the
//! [`ArtifactFetcher`] trait, which provides exactly two capabilities:
//! fetching a metadata page as text, and opening a streaming download.
//! Production code uses [`HttpFetcher`] over a shared [`reqwest::Client`];
//! tests substitute in-memory implementations to exercise retry and
//! concurrency behavior without a network.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::config::DownloadSettings;
use crate::constants::USER_AGENT;

/// Errors produced by fetch operations.
///
/// Transport, status, and mid-stream failures are deliberately collapsed
/// into one small taxonomy: callers only ever skip (metadata) or retry
/// (downloads), so the distinction that matters is *where* the request
/// failed, not the underlying stack's error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or completed (DNS, connect, timeout, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("HTTP status {status} for {url}")]
    Status {
        /// The response status code.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// The response body stream broke mid-transfer.
    #[error("stream interrupted: {0}")]
    Stream(String),
}

/// A streaming response body with an optional total-size hint.
///
/// The content length, when the server declares one, is used for progress
/// reporting only; correctness never depends on it.
pub struct ArtifactStream {
    content_length: Option<u64>,
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>,
}

impl ArtifactStream {
    /// Wrap a chunk stream, recording the declared content length if any.
    pub fn new(
        content_length: Option<u64>,
        inner: impl Stream<Item = Result<Bytes, FetchError>> + Send + 'static,
    ) -> Self {
        Self {
            content_length,
            inner: Box::pin(inner),
        }
    }

    /// The total size declared by the server, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Read the next chunk of the body.
    ///
    /// Returns `None` once the body is exhausted.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes, FetchError>> {
        self.inner.next().await
    }
}

impl std::fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// The two network capabilities the update pipeline consumes.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Single-shot GET returning the decoded response body.
    ///
    /// Any transport or status error collapses into a [`FetchError`]; no
    /// partial text is ever returned.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Open a streaming GET for an artifact download.
    async fn open_stream(&self, url: &str) -> Result<ArtifactStream, FetchError>;
}

/// Production [`ArtifactFetcher`] backed by [`reqwest`].
///
/// The client is built once per updater run with the connect/overall
/// timeouts from the download settings and a stable user agent, and is
/// cheaply cloneable across concurrent download tasks.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher from the configured download policy.
    pub fn new(settings: &DownloadSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(settings.timeout_duration())
            .timeout(settings.timeout_duration())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get_checked(url).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }

    async fn open_stream(&self, url: &str) -> Result<ArtifactStream, FetchError> {
        let response = self.get_checked(url).await?;
        let content_length = response.content_length();
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| FetchError::Stream(e.to_string())));
        Ok(ArtifactStream::new(content_length, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn artifact_stream_yields_chunks_in_order() {
        let chunks = vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
        let mut stream = ArtifactStream::new(Some(4), futures::stream::iter(chunks));

        assert_eq!(stream.content_length(), Some(4));
        assert_eq!(stream.next_chunk().await.unwrap().unwrap(), Bytes::from_static(b"ab"));
        assert_eq!(stream.next_chunk().await.unwrap().unwrap(), Bytes::from_static(b"cd"));
        assert!(stream.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn transport_errors_surface_through_stream() {
        let chunks: Vec<Result<Bytes, FetchError>> =
            vec![Ok(Bytes::from_static(b"ab")), Err(FetchError::Stream("reset".into()))];
        let mut stream = ArtifactStream::new(None, futures::stream::iter(chunks));

        assert!(stream.next_chunk().await.unwrap().is_ok());
        assert!(stream.next_chunk().await.unwrap().is_err());
    }
}
