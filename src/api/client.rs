use crate::config;
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Outcome of a single image download attempt. Request failures are not
/// errors; the destination stays absent so a later run retries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    AlreadyExists,
    RequestFailed,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new(user_agent: &str) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| {
                AppError::Argument(format!("Invalid user-agent header value: {}", e))
            })?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config::HTTP_TIMEOUT_SECONDS))
            .connect_timeout(Duration::from_secs(config::HTTP_CONNECT_TIMEOUT))
            .build()
            .map_err(AppError::from)?;
        Ok(ApiClient { client })
    }

    /// One GET, one chance. Returns `None` on a non-success status, invalid
    /// JSON, or JSON that is neither an object nor an array. Callers treat
    /// `None` as "skip this unit of work".
    pub async fn fetch_json(&self, url: &str) -> Option<Value> {
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                log(LogLevel::Debug, &format!("Failed to get {}: {}", url, e));
                return None;
            }
        };

        if !response.status().is_success() {
            log(
                LogLevel::Debug,
                &format!("Failed to get {} (HTTP {})", url, response.status()),
            );
            return None;
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                log(
                    LogLevel::Debug,
                    &format!("Failed to read body from {}: {}", url, e),
                );
                return None;
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) if value.is_object() || value.is_array() => Some(value),
            Ok(_) => {
                log(
                    LogLevel::Debug,
                    &format!("Failed to parse JSON from {}: not an object or array", url),
                );
                None
            }
            Err(e) => {
                log(
                    LogLevel::Debug,
                    &format!("Failed to parse JSON from {}: {}", url, e),
                );
                None
            }
        }
    }

    /// Stream a single URL to `dest`. No-op when the file already exists,
    /// making image downloads individually resumable. Nothing is written
    /// unless the response was successful, so a failed request leaves the
    /// path absent.
    pub async fn download_file(&self, url: &str, dest: &Path) -> AppResult<DownloadOutcome> {
        if fs::try_exists(dest).await.unwrap_or(false) {
            log(
                LogLevel::Debug,
                &format!("File {} already exists", dest.display()),
            );
            return Ok(DownloadOutcome::AlreadyExists);
        }

        let response = match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                log(
                    LogLevel::Debug,
                    &format!("Failed to download {} (HTTP {})", url, resp.status()),
                );
                return Ok(DownloadOutcome::RequestFailed);
            }
            Err(e) => {
                log(
                    LogLevel::Debug,
                    &format!("Failed to download {}: {}", url, e),
                );
                return Ok(DownloadOutcome::RequestFailed);
            }
        };

        let mut file = File::create(dest)
            .await
            .map_err(|e| AppError::io_at(e, dest))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk: Bytes = chunk.map_err(AppError::from)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::io_at(e, dest))?;
        }
        file.flush().await.map_err(|e| AppError::io_at(e, dest))?;

        log(
            LogLevel::Debug,
            &format!("Downloaded {} to {}", url, dest.display()),
        );
        Ok(DownloadOutcome::Downloaded)
    }
}
