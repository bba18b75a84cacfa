//! WAGO: manufacturer catalog search, product cards without prices.

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

const VENDOR: &str = "WAGO";
const ORIGIN: &str = "https://www.wago.com";
const SEARCH_PATH: &str = "/tw/search";
const PRICE_NOT_LISTED: &str = "Manufacturer site does not list prices";
const STOCK_NOT_LISTED: &str = "Manufacturer site does not list stock";

/// Scrapes the WAGO Taiwan product search.
pub struct Wago<F: Fetcher> {
    fetcher: F,
    origin: Url,
    timeout: Duration,
}

impl<F: Fetcher> Wago<F> {
    pub fn new(fetcher: F) -> Result<Self, AppError> {
        Ok(Self {
            fetcher,
            origin: parse_origin(ORIGIN)?,
            timeout: Duration::from_secs(15),
        })
    }

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
        let url = search_url(&self.origin, SEARCH_PATH, &[("query", query.as_str())])?;
        let body = fetch_body(&self.fetcher, VENDOR, &url, headers, self.timeout).await?;
        parse_wago_html(&body, &self.origin)
    }
}

impl<F: Fetcher> SourceAdapter for Wago<F> {
    fn vendor(&self) -> &str {
        VENDOR
    }

    async fn fetch(&self, query: &ComponentQuery, headers: &HeaderSet) -> Vec<SourceResult> {
        into_results(VENDOR, self.lookup(query, headers).await)
    }
}

fn parse_wago_html(html: &str, origin: &Url) -> Result<Vec<Listing>, AppError> {
    let document = Html::parse_document(html);

    let card_sel = selector("div.product-list__item")?;
    let title_sel = selector("h3.product-list__item-title")?;
    let link_sel = selector("a.product-list__item-link")?;

    let mut cards = 0usize;
    let mut listings = Vec::new();

    for card in document.select(&card_sel) {
        cards += 1;

        let title = card.select(&title_sel).next().map(element_text);
        let href = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"));

        let (Some(title), Some(href)) = (title, href) else {
            continue;
        };
        if title.is_empty() {
            continue;
        }

        let link = match absolute_link(origin, href) {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!(vendor = VENDOR, href, error = %e, "Skipping card with unusable link");
                continue;
            }
        };

        listings.push(Listing {
            vendor: VENDOR.to_string(),
            name: title,
            link,
            price: PRICE_NOT_LISTED.to_string(),
            stock: STOCK_NOT_LISTED.to_string(),
        });

        if listings.len() >= MAX_LISTINGS_PER_VENDOR {
            break;
        }
    }

    if cards > 0 && listings.is_empty() {
        return Err(AppError::ParseError(format!(
            "{cards} product cards without title or link"
        )));
    }

    tracing::debug!(vendor = VENDOR, cards, count = listings.len(), "Parsed results");
    Ok(listings)
}
