//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{ComponentQuery, Failure, FailureReason, Listing, SourceResult};
use crate::pacing::HeaderSet;
use crate::traits::{Fetcher, Page, ReplyHandle, ReplySender, SourceAdapter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// A request recorded by [`MockFetcher`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HeaderSet,
    pub timeout: Duration,
}

/// Mock fetcher that returns configurable pages.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns an empty 200 page.
    responses: Arc<Mutex<Vec<Result<Page, AppError>>>>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockFetcher {
    /// Always answers `200 OK` with `html`.
    pub fn new(html: &str) -> Self {
        Self::with_page(200, html)
    }

    pub fn with_page(status: u16, html: &str) -> Self {
        Self::with_responses(vec![Ok(Page {
            final_url: "https://vendor.example/search".to_string(),
            status,
            body: html.to_string(),
        })])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<Page, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, headers: &HeaderSet, timeout: Duration) -> Result<Page, AppError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            timeout,
        });
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Page {
                final_url: url.to_string(),
                status: 200,
                body: "<html><body></body></html>".to_string(),
            })
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockAdapter
// ---------------------------------------------------------------------------

/// `n` distinct listings for `vendor`.
pub fn mock_listings(vendor: &str, n: usize) -> Vec<SourceResult> {
    (0..n)
        .map(|i| {
            SourceResult::Listing(Listing {
                vendor: vendor.to_string(),
                name: format!("{vendor} part {i}"),
                link: format!("https://vendor.example/{i}"),
                price: format!("NT${}", 10 * (i + 1)),
                stock: format!("{} in stock", 100 + i),
            })
        })
        .collect()
}

/// Mock adapter returning scripted results and recording what it was asked.
#[derive(Clone)]
pub struct MockAdapter {
    vendor: String,
    results: Vec<SourceResult>,
    networked: bool,
    panics: bool,
    seen: Arc<Mutex<Vec<(String, HeaderSet)>>>,
}

impl MockAdapter {
    pub fn with_results(vendor: &str, results: Vec<SourceResult>) -> Self {
        Self {
            vendor: vendor.to_string(),
            results,
            networked: true,
            panics: false,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_listings(vendor: &str, n: usize) -> Self {
        Self::with_results(vendor, mock_listings(vendor, n))
    }

    pub fn failing(vendor: &str, reason: FailureReason) -> Self {
        Self::with_results(vendor, vec![SourceResult::Failure(Failure::new(vendor, reason))])
    }

    /// Panics when fetched.
    pub fn panicking(vendor: &str) -> Self {
        Self {
            panics: true,
            ..Self::with_results(vendor, vec![])
        }
    }

    /// A placeholder-style adapter that does no network I/O.
    pub fn offline(vendor: &str) -> Self {
        Self {
            networked: false,
            ..Self::with_listings(vendor, 1)
        }
    }

    /// A catalog-style adapter: offline, one `ManualLookup` failure.
    pub fn catalog(vendor: &str) -> Self {
        Self {
            networked: false,
            ..Self::with_results(
                vendor,
                vec![SourceResult::Failure(
                    Failure::new(vendor, FailureReason::ManualLookup)
                        .with_link("https://vendor.example/catalog.pdf"),
                )],
            )
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// `(query, headers)` for every call so far.
    pub fn seen(&self) -> Vec<(String, HeaderSet)> {
        self.seen.lock().unwrap().clone()
    }
}

impl SourceAdapter for MockAdapter {
    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn needs_network(&self) -> bool {
        self.networked
    }

    async fn fetch(&self, query: &ComponentQuery, headers: &HeaderSet) -> Vec<SourceResult> {
        self.seen
            .lock()
            .unwrap()
            .push((query.as_str().to_string(), headers.clone()));
        if self.panics {
            panic!("{} adapter exploded", self.vendor);
        }
        self.results.clone()
    }
}

// ---------------------------------------------------------------------------
// MockSender
// ---------------------------------------------------------------------------

/// Mock reply sender that records every delivery.
#[derive(Clone)]
pub struct MockSender {
    pub sent: Arc<Mutex<Vec<(ReplyHandle, Vec<String>)>>>,
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Fails the next delivery with `error`.
    pub fn with_error(error: AppError) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplySender for MockSender {
    async fn send(&self, handle: &ReplyHandle, blocks: &[String]) -> Result<(), AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        self.sent
            .lock()
            .unwrap()
            .push((handle.clone(), blocks.to_vec()));
        Ok(())
    }
}
