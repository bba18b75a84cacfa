pub mod aggregate;
pub mod chunker;
pub mod error;
pub mod models;
pub mod pacing;
pub mod reply;
pub mod traits;
pub mod util;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use aggregate::Aggregator;
pub use chunker::{DEFAULT_MAX_BLOCK_CHARS, render};
pub use error::AppError;
pub use models::{AggregateResult, ComponentQuery, Failure, FailureReason, Listing, SourceResult};
pub use pacing::{HeaderSet, PacingConfig, PacingController};
pub use reply::{QUERY_PROMPT, QueryResponder};
pub use traits::{Fetcher, Page, ReplyHandle, ReplySender, SourceAdapter};
