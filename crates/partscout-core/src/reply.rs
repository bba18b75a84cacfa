use crate::aggregate::Aggregator;
use crate::chunker::{self, DEFAULT_MAX_BLOCK_CHARS};
use crate::error::AppError;
use crate::models::ComponentQuery;
use crate::traits::{ReplyHandle, ReplySender, SourceAdapter};

/// Sent when the message holds no query.
pub const QUERY_PROMPT: &str = "Hi! Send me a part name or model number to look up.";

/// Turns an incoming chat message into the text blocks to send back.
pub struct QueryResponder<A>
where
    A: SourceAdapter,
{
    aggregator: Aggregator<A>,
    max_block_size: usize,
}

impl<A> QueryResponder<A>
where
    A: SourceAdapter,
{
    pub fn new(aggregator: Aggregator<A>) -> Self {
        Self {
            aggregator,
            max_block_size: DEFAULT_MAX_BLOCK_CHARS,
        }
    }

    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn aggregator(&self) -> &Aggregator<A> {
        &self.aggregator
    }

    /// Blank text gets the canned prompt; anything else is searched.
    pub async fn respond(&self, raw: &str) -> Vec<String> {
        let query = match ComponentQuery::parse(raw) {
            Ok(query) => query,
            Err(AppError::InvalidQuery) => {
                tracing::info!("Blank query, sending prompt");
                return vec![QUERY_PROMPT.to_string()];
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unexpected query error, sending prompt");
                return vec![QUERY_PROMPT.to_string()];
            }
        };

        let aggregate = self.aggregator.search(&query).await;
        let blocks = chunker::render(&aggregate.results, self.max_block_size);
        tracing::info!(query = %query, blocks = blocks.len(), "Reply rendered");
        blocks
    }

    /// Answer `raw` and hand the blocks to `sender`.
    ///
    /// The search always runs to completion; a delivery failure is returned
    /// to the caller after the fact.
    pub async fn respond_and_send<S: ReplySender>(
        &self,
        raw: &str,
        handle: &ReplyHandle,
        sender: &S,
    ) -> Result<usize, AppError> {
        let blocks = self.respond(raw).await;
        sender.send(handle, &blocks).await?;
        Ok(blocks.len())
    }
}
