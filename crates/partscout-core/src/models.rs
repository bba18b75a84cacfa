use std::fmt;

use serde::Serialize;

use crate::error::AppError;

/// Upper bound on listings kept per vendor for a single query.
pub const MAX_LISTINGS_PER_VENDOR: usize = 3;

/// A validated, trimmed, non-empty part name or model number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ComponentQuery(String);

impl ComponentQuery {
    /// Trim the raw text and reject it if nothing is left.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One product found at a vendor.
///
/// `price` and `stock` are vendor-formatted text and may hold a
/// placeholder such as "not listed" when the vendor publishes neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub vendor: String,
    pub name: String,
    /// Absolute URL of the product page.
    pub link: String,
    pub price: String,
    pub stock: String,
}

/// Coarse cause category for a vendor that produced no listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Connection failure, timeout or non-2xx status.
    NetworkError,
    /// Anti-bot page detected.
    Blocked,
    /// Valid response without matching items.
    NotFound,
    /// Expected structure missing, most likely markup drift.
    ParseError,
    /// The vendor only publishes a document that has to be read by hand.
    ManualLookup,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::NetworkError => "Could not reach the site",
            FailureReason::Blocked => "Blocked by the site's anti-bot check",
            FailureReason::NotFound => "No matching parts found",
            FailureReason::ParseError => "Page layout not recognised, the site may have changed",
            FailureReason::ManualLookup => "Automated lookup is not possible, check the catalog manually",
        };
        f.write_str(text)
    }
}

/// A vendor that produced no listings, with the reason why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub vendor: String,
    pub reason: FailureReason,
    /// Extra context such as an HTTP status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Where the user can look instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Failure {
    pub fn new(vendor: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            vendor: vendor.into(),
            reason,
            detail: None,
            link: None,
        }
    }

    /// Build a failure entry from an adapter error.
    pub fn from_error(vendor: impl Into<String>, err: &AppError) -> Self {
        Self {
            vendor: vendor.into(),
            reason: err.failure_reason(),
            detail: err.detail(),
            link: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// One entry of an aggregate result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceResult {
    Listing(Listing),
    Failure(Failure),
}

impl SourceResult {
    pub fn vendor(&self) -> &str {
        match self {
            SourceResult::Listing(listing) => &listing.vendor,
            SourceResult::Failure(failure) => &failure.vendor,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceResult::Failure(_))
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            SourceResult::Failure(failure) => Some(failure.reason),
            SourceResult::Listing(_) => None,
        }
    }
}

/// Turn an adapter's fallible listing lookup into its result sequence.
///
/// `Ok` with no listings becomes a `NotFound` failure; more than
/// [`MAX_LISTINGS_PER_VENDOR`] listings are truncated.
pub fn into_results(vendor: &str, outcome: Result<Vec<Listing>, AppError>) -> Vec<SourceResult> {
    match outcome {
        Ok(listings) if listings.is_empty() => {
            vec![SourceResult::Failure(Failure::new(
                vendor,
                FailureReason::NotFound,
            ))]
        }
        Ok(listings) => listings
            .into_iter()
            .take(MAX_LISTINGS_PER_VENDOR)
            .map(SourceResult::Listing)
            .collect(),
        Err(err) => {
            tracing::warn!(vendor, reason = ?err.failure_reason(), error = %err, "Vendor lookup failed");
            vec![SourceResult::Failure(Failure::from_error(vendor, &err))]
        }
    }
}

/// Results for one query, in vendor priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub query: String,
    pub results: Vec<SourceResult>,
}

impl AggregateResult {
    pub fn new(query: &ComponentQuery) -> Self {
        Self {
            query: query.as_str().to_string(),
            results: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceResult> {
        self.results.iter()
    }

    pub fn listing_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_failure()).count()
    }
}
