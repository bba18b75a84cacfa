use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{ComponentQuery, SourceResult};
use crate::pacing::HeaderSet;

/// A completed HTTP response, whatever its status.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one GET request with the given identity headers.
///
/// Completed responses are returned as a [`Page`] even when the status is
/// not 2xx, so callers can look for anti-bot pages before judging the status.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(
        &self,
        url: &str,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> impl Future<Output = Result<Page, AppError>> + Send;
}

/// Fetches and parses one vendor's listings for a query.
///
/// Implementations never return an error: every fault is folded into a
/// single [`SourceResult::Failure`] for the vendor.
pub trait SourceAdapter: Send + Sync {
    /// Display name used in every result this adapter produces.
    fn vendor(&self) -> &str;

    /// Whether `fetch` performs network I/O. Pacing delays are only taken
    /// between adapters that do.
    fn needs_network(&self) -> bool {
        true
    }

    fn fetch(
        &self,
        query: &ComponentQuery,
        headers: &HeaderSet,
    ) -> impl Future<Output = Vec<SourceResult>> + Send;
}

/// Opaque reference the messaging platform gives us to answer one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyHandle {
    pub reply_token: String,
    /// Lets overflow messages be pushed once the reply slot is used up.
    pub user_id: Option<String>,
}

/// Delivers rendered text blocks back to whoever asked.
pub trait ReplySender: Send + Sync + Clone {
    /// Deliver `blocks` in order, one message per block.
    fn send(
        &self,
        handle: &ReplyHandle,
        blocks: &[String],
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}
