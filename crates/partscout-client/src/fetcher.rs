use std::time::Duration;

use partscout_core::error::AppError;
use partscout_core::pacing::HeaderSet;
use partscout_core::traits::{Fetcher, Page};
use reqwest::Client;

/// HTTP fetcher using reqwest.
///
/// Identity headers and the timeout are supplied per request, so one client
/// (and its connection pool) is shared by every vendor adapter.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, headers: &HeaderSet, timeout: Duration) -> Result<Page, AppError> {
        let timeout_secs = timeout.as_secs();
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| map_send_error(e, timeout_secs))?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(timeout_secs)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })?;

        tracing::debug!(url = %final_url, status, bytes = body.len(), "Fetched page");
        Ok(Page {
            final_url,
            status,
            body,
        })
    }
}

fn map_send_error(e: reqwest::Error, timeout_secs: u64) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout_secs)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}
