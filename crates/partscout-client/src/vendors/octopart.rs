//! Octopart: a client-rendered search page.
//!
//! There is no browser here. The server embeds the initial page state as
//! JSON in `script#__NEXT_DATA__`, and the results are read from that.

use std::time::Duration;

use partscout_core::error::AppError;
use partscout_core::models::{
    ComponentQuery, Listing, MAX_LISTINGS_PER_VENDOR, SourceResult, into_results,
};
use partscout_core::pacing::HeaderSet;
use partscout_core::traits::{Fetcher, SourceAdapter};
use partscout_core::util::{absolute_link, search_url};
use scraper::Html;
use serde_json::Value;
use url::Url;

use super::{fetch_body, parse_origin, selector};

const VENDOR: &str = "Octopart";
const ORIGIN: &str = "https://octopart.com";
const SEARCH_PATH: &str = "/search";
const RESULTS_POINTER: &str = "/props/pageProps/search/results";
const NO_PRICE_DATA: &str = "No price data";
const NO_STOCK_DATA: &str = "No stock data";

pub struct Octopart<F: Fetcher> {
    fetcher: F,
    origin: Url,
    timeout: Duration,
}

impl<F: Fetcher> Octopart<F> {
    pub fn new(fetcher: F) -> Result<Self, AppError> {
        Ok(Self {
            fetcher,
            origin: parse_origin(ORIGIN)?,
            timeout: Duration::from_secs(20),
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
        let url = search_url(&self.origin, SEARCH_PATH, &[("q", query.as_str())])?;
        let body = fetch_body(&self.fetcher, VENDOR, &url, headers, self.timeout).await?;
        let state = embedded_state(&body)?;
        parse_octopart_state(&state, &self.origin)
    }
}

impl<F: Fetcher> SourceAdapter for Octopart<F> {
    fn vendor(&self) -> &str {
        VENDOR
    }

    async fn fetch(&self, query: &ComponentQuery, headers: &HeaderSet) -> Vec<SourceResult> {
        into_results(VENDOR, self.lookup(query, headers).await)
    }
}

/// Pull the `__NEXT_DATA__` JSON out of the page.
fn embedded_state(html: &str) -> Result<Value, AppError> {
    let document = Html::parse_document(html);
    let script_sel = selector("script#__NEXT_DATA__")?;

    let raw = document
        .select(&script_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or_else(|| AppError::ParseError("embedded page state missing".into()))?;

    Ok(serde_json::from_str(&raw)?)
}

fn parse_octopart_state(state: &Value, origin: &Url) -> Result<Vec<Listing>, AppError> {
    let results = state
        .pointer(RESULTS_POINTER)
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::ParseError("search results missing from page state".into()))?;

    let mut listings = Vec::new();
    for result in results {
        let Some(part) = result.get("part") else {
            continue;
        };
        let Some(mpn) = part.get("mpn").and_then(Value::as_str) else {
            continue;
        };
        let Some(slug) = part.get("slug").and_then(Value::as_str) else {
            continue;
        };

        let name = match part.pointer("/manufacturer/name").and_then(Value::as_str) {
            Some(manufacturer) => format!("{manufacturer} {mpn}"),
            None => mpn.to_string(),
        };

        let link = match absolute_link(origin, slug) {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!(vendor = VENDOR, slug, error = %e, "Skipping result with unusable link");
                continue;
            }
        };

        listings.push(Listing {
            vendor: VENDOR.to_string(),
            name,
            link,
            price: format_price(part.get("median_price_1000")),
            stock: part
                .get("total_avail")
                .and_then(Value::as_u64)
                .map(|n| format!("{n} available across distributors"))
                .unwrap_or_else(|| NO_STOCK_DATA.to_string()),
        });

        if listings.len() >= MAX_LISTINGS_PER_VENDOR {
            break;
        }
    }

    if !results.is_empty() && listings.is_empty() {
        return Err(AppError::ParseError(format!(
            "{} results without part number or link",
            results.len()
        )));
    }

    tracing::debug!(vendor = VENDOR, results = results.len(), count = listings.len(), "Parsed results");
    Ok(listings)
}

fn format_price(median: Option<&Value>) -> String {
    let Some(median) = median else {
        return NO_PRICE_DATA.to_string();
    };
    let price = median.get("price").and_then(Value::as_f64);
    let currency = median.get("currency").and_then(Value::as_str).unwrap_or("USD");
    match price {
        Some(price) => format!("{currency} {price} (median @1k)"),
        None => NO_PRICE_DATA.to_string(),
    }
}
