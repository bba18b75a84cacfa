//! RS Components: distributor search results rendered as an HTML table.

use std::time::Duration;

use partscout_core::error::AppError;
use partscout_core::models::{
    ComponentQuery, Listing, MAX_LISTINGS_PER_VENDOR, SourceResult, into_results,
};
use partscout_core::pacing::HeaderSet;
use partscout_core::traits::{Fetcher, SourceAdapter};
use partscout_core::util::{absolute_link, search_url};
use scraper::Html;
use url::Url;

use super::{element_text, fetch_body, parse_origin, selector};

const VENDOR: &str = "RS Components";
const ORIGIN: &str = "https://twcn.rs-online.com";
const SEARCH_PATH: &str = "/web/search/searchBrowseAction.html?sra=grp";
const NO_STOCK_INFO: &str = "No stock information";

/// Scrapes the RS Components Taiwan search page.
pub struct RsComponents<F: Fetcher> {
    fetcher: F,
    origin: Url,
    timeout: Duration,
}

impl<F: Fetcher> RsComponents<F> {
    pub fn new(fetcher: F) -> Result<Self, AppError> {
        Ok(Self {
            fetcher,
            origin: parse_origin(ORIGIN)?,
            timeout: Duration::from_secs(10),
        })
    }

    /// Point the adapter at another host, e.g. a local mock server.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn lookup(
        &self,
        query: &ComponentQuery,
        headers: &HeaderSet,
    ) -> Result<Vec<Listing>, AppError> {
        let url = search_url(&self.origin, SEARCH_PATH, &[("searchTerm", query.as_str())])?;
        let body = fetch_body(&self.fetcher, VENDOR, &url, headers, self.timeout).await?;
        parse_rs_html(&body, &self.origin)
    }
}

impl<F: Fetcher> SourceAdapter for RsComponents<F> {
    fn vendor(&self) -> &str {
        VENDOR
    }

    async fn fetch(&self, query: &ComponentQuery, headers: &HeaderSet) -> Vec<SourceResult> {
        into_results(VENDOR, self.lookup(query, headers).await)
    }
}

/// Parse product rows from an RS search page.
///
/// No rows means no match. Rows that lack a product link or price are
/// skipped; if every row is incomplete the layout has probably changed.
fn parse_rs_html(html: &str, origin: &Url) -> Result<Vec<Listing>, AppError> {
    let document = Html::parse_document(html);

    let row_sel = selector("tr.product-row")?;
    let link_sel = selector("a.description-link")?;
    let price_sel = selector("span.price")?;
    let stock_sel = selector("span.stock-value")?;

    let mut rows = 0usize;
    let mut listings = Vec::new();

    for row in document.select(&row_sel) {
        rows += 1;

        let Some(link_el) = row.select(&link_sel).next() else {
            continue;
        };
        let Some(price_el) = row.select(&price_sel).next() else {
            continue;
        };
        let Some(href) = link_el.value().attr("href") else {
            continue;
        };

        let name = element_text(link_el);
        if name.is_empty() {
            continue;
        }
        let stock = row
            .select(&stock_sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_STOCK_INFO.to_string());

        let link = match absolute_link(origin, href) {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!(vendor = VENDOR, href, error = %e, "Skipping row with unusable link");
                continue;
            }
        };

        listings.push(Listing {
            vendor: VENDOR.to_string(),
            name,
            link,
            price: element_text(price_el),
            stock,
        });

        if listings.len() >= MAX_LISTINGS_PER_VENDOR {
            break;
        }
    }

    if rows > 0 && listings.is_empty() {
        return Err(AppError::ParseError(format!(
            "{rows} product rows without link or price"
        )));
    }

    tracing::debug!(vendor = VENDOR, rows, count = listings.len(), "Parsed results");
    Ok(listings)
}
