//! Rendering of aggregate results into chat-sized text blocks.
//!
//! Each [`SourceResult`] becomes one paragraph. Paragraphs are packed
//! greedily into blocks of at most `max_block_size` characters and are never
//! split: a paragraph that is larger than the budget on its own gets a block
//! to itself and overflows it.

use crate::models::{Failure, Listing, SourceResult};

/// Hard per-message ceiling of the delivery channel, in characters.
pub const TRANSPORT_MESSAGE_LIMIT: usize = 2000;

/// Default block budget, leaving headroom under [`TRANSPORT_MESSAGE_LIMIT`].
pub const DEFAULT_MAX_BLOCK_CHARS: usize = 1800;

/// Appended to every paragraph.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Sent instead of an empty reply.
pub const NO_RESULTS_NOTICE: &str =
    "Sorry, no vendor information was found for this part. Please try another keyword.";

/// Render one entry as a self-contained paragraph, without separator.
pub fn render_entry(entry: &SourceResult) -> String {
    match entry {
        SourceResult::Listing(listing) => render_listing(listing),
        SourceResult::Failure(failure) => render_failure(failure),
    }
}

fn render_listing(listing: &Listing) -> String {
    format!(
        "Vendor: {}\nName: {}\nPrice/Stock: {} / {}\nLink: {}",
        listing.vendor, listing.name, listing.price, listing.stock, listing.link
    )
}

fn render_failure(failure: &Failure) -> String {
    let mut text = format!("Vendor: {}\nStatus: {}", failure.vendor, failure.reason);
    if let Some(detail) = &failure.detail {
        text.push_str(&format!(" ({detail})"));
    }
    if let Some(link) = &failure.link {
        text.push_str(&format!("\nLink: {link}"));
    }
    text
}

/// Pack rendered entries into blocks of at most `max_block_size` characters.
///
/// Every block but the last keeps its trailing separator, so joining all
/// blocks reproduces the paragraph stream. An empty input renders as a
/// single [`NO_RESULTS_NOTICE`] block.
pub fn render(results: &[SourceResult], max_block_size: usize) -> Vec<String> {
    if results.is_empty() {
        return vec![NO_RESULTS_NOTICE.to_string()];
    }

    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for entry in results {
        let paragraph = render_entry(entry) + PARAGRAPH_SEPARATOR;
        let paragraph_len = paragraph.chars().count();

        if !current.is_empty() && current_len + paragraph_len > max_block_size {
            blocks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current.is_empty() && paragraph_len > max_block_size {
            tracing::warn!(
                vendor = entry.vendor(),
                chars = paragraph_len,
                max_block_size,
                "Paragraph exceeds block budget, sending it whole"
            );
        }
        current.push_str(&paragraph);
        current_len += paragraph_len;
    }

    let last = current.trim_end().to_string();
    blocks.push(last);
    blocks
}
