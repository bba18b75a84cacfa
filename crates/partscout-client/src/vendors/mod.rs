//! Vendor adapters, one per parts source, and the registry that orders them.
//!
//! Networked adapters share one [`Fetcher`] and follow the same path:
//! build the search URL, fetch, reject anti-bot or error pages, then parse.
//! Every fault ends up as a single failure entry for that vendor.

mod catalog;
mod octopart;
mod placeholder;
mod rs_components;
mod wago;

use std::time::Duration;

use partscout_core::aggregate::Aggregator;
use partscout_core::error::AppError;
use partscout_core::models::{ComponentQuery, SourceResult};
use partscout_core::pacing::{HeaderSet, PacingController, ensure_usable};
use partscout_core::traits::{Fetcher, SourceAdapter};
use partscout_core::util::squash_whitespace;
use scraper::{ElementRef, Selector};
use url::Url;

pub use catalog::PdfCatalog;
pub use octopart::Octopart;
pub use placeholder::Placeholder;
pub use rs_components::RsComponents;
pub use wago::Wago;

/// Any of the supported vendors, dispatched by variant.
pub enum VendorAdapter<F: Fetcher> {
    RsComponents(RsComponents<F>),
    Wago(Wago<F>),
    Placeholder(Placeholder),
    Octopart(Octopart<F>),
    Catalog(PdfCatalog),
}

impl<F: Fetcher> SourceAdapter for VendorAdapter<F> {
    fn vendor(&self) -> &str {
        match self {
            VendorAdapter::RsComponents(a) => a.vendor(),
            VendorAdapter::Wago(a) => a.vendor(),
            VendorAdapter::Placeholder(a) => a.vendor(),
            VendorAdapter::Octopart(a) => a.vendor(),
            VendorAdapter::Catalog(a) => a.vendor(),
        }
    }

    fn needs_network(&self) -> bool {
        match self {
            VendorAdapter::RsComponents(a) => a.needs_network(),
            VendorAdapter::Wago(a) => a.needs_network(),
            VendorAdapter::Placeholder(a) => a.needs_network(),
            VendorAdapter::Octopart(a) => a.needs_network(),
            VendorAdapter::Catalog(a) => a.needs_network(),
        }
    }

    async fn fetch(&self, query: &ComponentQuery, headers: &HeaderSet) -> Vec<SourceResult> {
        match self {
            VendorAdapter::RsComponents(a) => a.fetch(query, headers).await,
            VendorAdapter::Wago(a) => a.fetch(query, headers).await,
            VendorAdapter::Placeholder(a) => a.fetch(query, headers).await,
            VendorAdapter::Octopart(a) => a.fetch(query, headers).await,
            VendorAdapter::Catalog(a) => a.fetch(query, headers).await,
        }
    }
}

/// Vendors in priority order, plus the catalog entry that always goes last.
pub fn default_vendors<F: Fetcher>(
    fetcher: F,
) -> Result<(Vec<VendorAdapter<F>>, VendorAdapter<F>), AppError> {
    let vendors = vec![
        VendorAdapter::RsComponents(RsComponents::new(fetcher.clone())?),
        VendorAdapter::Wago(Wago::new(fetcher.clone())?),
        VendorAdapter::Placeholder(Placeholder::digikey()?),
        VendorAdapter::Placeholder(Placeholder::mouser()?),
        VendorAdapter::Octopart(Octopart::new(fetcher)?),
    ];
    Ok((vendors, VendorAdapter::Catalog(PdfCatalog::kss())))
}

/// Aggregator over [`default_vendors`].
pub fn build_aggregator<F: Fetcher>(
    fetcher: F,
    pacing: PacingController,
) -> Result<Aggregator<VendorAdapter<F>>, AppError> {
    let (vendors, catalog) = default_vendors(fetcher)?;
    Ok(Aggregator::new(vendors, catalog, pacing))
}

pub(crate) fn parse_origin(origin: &str) -> Result<Url, AppError> {
    Url::parse(origin).map_err(|e| AppError::ConfigError(format!("Invalid vendor origin '{origin}': {e}")))
}

/// Fetch a search page and reject anti-bot pages and error statuses.
pub(crate) async fn fetch_body<F: Fetcher>(
    fetcher: &F,
    vendor: &str,
    url: &Url,
    headers: &HeaderSet,
    timeout: Duration,
) -> Result<String, AppError> {
    tracing::info!(vendor, url = %url, "Fetching vendor search page");
    let page = fetcher.fetch(url.as_str(), headers, timeout).await?;
    ensure_usable(&page)?;
    Ok(page.body)
}

pub(crate) fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::ParseError(format!("invalid selector '{css}': {e:?}")))
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    squash_whitespace(&element.text().collect::<String>())
}
