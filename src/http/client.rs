//! HTTP client with retry for GitHub API calls and artifact downloads.

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::time::Duration;

use super::retry::{MAX_RETRIES, RETRY_DELAY_MS, check_retryable, is_retryable};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Override the pause between attempts
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET a JSON document, retrying transient failures.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        self.with_retry("GET JSON", || async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?;

            let response = response.error_for_status().map_err(check_retryable)?;

            response
                .json::<T>()
                .await
                .with_context(|| format!("Failed to parse JSON response from {}", url))
        })
        .await
    }

    /// Stream a URL into a fresh writer, retrying transient failures.
    ///
    /// `create_writer` is called once per attempt so a failed partial
    /// download never leaks into the next attempt. `accept` overrides the
    /// `Accept` header (GitHub's asset API wants `application/octet-stream`).
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(
        &self,
        url: &str,
        accept: Option<&str>,
        create_writer: F,
    ) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        let create_writer = &create_writer;
        self.with_retry("Download", move || {
            self.download_file_once(url, accept, create_writer)
        })
        .await
    }

    async fn download_file_once<W, F>(
        &self,
        url: &str,
        accept: Option<&str>,
        create_writer: &F,
    ) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to start download of {}", url))?;
        let mut response = response.error_for_status().map_err(check_retryable)?;

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB from {}",
            downloaded_bytes as f64 / (1024.0 * 1024.0),
            url
        );
        Ok(downloaded_bytes)
    }

    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !is_retryable(&e) => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {:?}...",
                            operation_name, attempt, MAX_RETRIES, e, self.retry_delay
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)))
    }
}
