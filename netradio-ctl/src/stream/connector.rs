//! Outbound stream connections
//!
//! The [`StreamConnector`] seam lets sessions open a transport without
//! knowing whether it is a real HTTP stream or a scripted test source.

use crate::error::{Error, Result, StreamError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use netradio_common::config::StreamConfig;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use tracing::debug;

/// Received body chunks; an `Err` ends the transfer
pub type ByteStream = BoxStream<'static, std::result::Result<Bytes, StreamError>>;

/// An established stream connection. Dropping it releases the connection.
pub struct StreamTransport {
    /// Metadata interval announced by the server (`icy-metaint`)
    pub metaint: Option<usize>,
    /// `icy-name` header
    pub station_name: Option<String>,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("metaint", &self.metaint)
            .field("station_name", &self.station_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &str) -> std::result::Result<StreamTransport, StreamError>;
}

/// HTTP(S) connector requesting ICY metadata
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new(config: &StreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StreamConnector for HttpConnector {
    async fn connect(&self, url: &str) -> std::result::Result<StreamTransport, StreamError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| StreamError::fatal(format!("invalid stream URL {:?}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StreamError::fatal(format!(
                "unsupported stream scheme {:?}",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .header("Icy-MetaData", "1")
            .send()
            .await?
            .error_for_status()?;

        let headers = response.headers();
        let metaint = header_str(headers, "icy-metaint").and_then(|v| v.parse::<usize>().ok());
        let station_name = header_str(headers, "icy-name").map(str::to_string);
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(
            "Connected to {} (metaint={:?}, content-type={:?})",
            url, metaint, content_type
        );

        let body = response.bytes_stream().map_err(StreamError::from).boxed();

        Ok(StreamTransport {
            metaint,
            station_name,
            content_type,
            body,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
