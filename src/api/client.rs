use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::models::FetchConfig;
use crate::domain::FetchError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP client could not be built: {0}")]
    Build(reqwest::Error),

    #[error("Server responded with HTTP {0}")]
    Status(u16),

    #[error("timed out after {0:?} waiting for response headers")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, ApiError>;

pub type BodyStream = BoxStream<'static, Result<bytes::Bytes>>;

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status(code) => FetchError::RemoteError(code),
            other => FetchError::NetworkError(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ApiError::Build)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Issue the GET and hand back the body as a stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(&self, url: &Url) -> Result<(Option<u64>, BodyStream)> {
        let request = self.http.get(url.clone()).send();
        let response = tokio::time::timeout(self.config.read_timeout, request)
            .await
            .map_err(|_| ApiError::Timeout(self.config.read_timeout))??;

        let status = response.status();
        debug!(%url, %status, "response headers received");
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::Request).boxed();

        Ok((total_size, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_remote_error() {
        let err: FetchError = ApiError::Status(404).into();
        assert_eq!(err, FetchError::RemoteError(404));
    }

    #[tokio::test]
    async fn test_stream_reports_content_length() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data.bin")
            .with_status(200)
            .with_body(vec![7u8; 1000])
            .create_async()
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/data.bin", server.url())).unwrap();
        let (total, stream) = client.download_file_stream(&url).await.unwrap();
        let body: Vec<bytes::Bytes> = stream.try_collect().await.unwrap();

        assert_eq!(total, Some(1000));
        assert_eq!(body.iter().map(|b| b.len()).sum::<usize>(), 1000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering.
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = FetchClient::new(FetchConfig {
            read_timeout: std::time::Duration::from_millis(100),
            ..FetchConfig::default()
        })
        .unwrap();
        let url = Url::parse(&format!("http://{}/sample.zip", addr)).unwrap();
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client.download_file_stream(&url),
        )
        .await
        .expect("request should give up on its own");

        let err = result.err().unwrap();
        assert!(matches!(err, ApiError::Timeout(_)));
        assert!(matches!(FetchError::from(err), FetchError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .create_async()
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/missing.zip", server.url())).unwrap();
        let err = client.download_file_stream(&url).await.err().unwrap();
        assert!(matches!(err, ApiError::Status(404)));
    }
}
