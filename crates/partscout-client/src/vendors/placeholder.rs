//! Vendors whose scraping is not written yet.
//!
//! They still answer every query, with a stub listing that links to the
//! vendor's own search page so the user can look by hand.

use partscout_core::error::AppError;
use partscout_core::models::{ComponentQuery, Listing, SourceResult, into_results};
use partscout_core::pacing::HeaderSet;
use partscout_core::traits::SourceAdapter;
use partscout_core::util::search_url;
use url::Url;

use super::parse_origin;

const PENDING: &str = "Pending";

/// Stub adapter for a vendor without extraction logic.
pub struct Placeholder {
    vendor: &'static str,
    origin: Url,
    search_path: &'static str,
    query_param: &'static str,
}

impl Placeholder {
    pub fn digikey() -> Result<Self, AppError> {
        Ok(Self {
            vendor: "Digi-Key",
            origin: parse_origin("https://www.digikey.tw")?,
            search_path: "/zh/products/search",
            query_param: "keywords",
        })
    }

    pub fn mouser() -> Result<Self, AppError> {
        Ok(Self {
            vendor: "Mouser",
            origin: parse_origin("https://www.mouser.tw")?,
            search_path: "/Search/Refine",
            query_param: "Keyword",
        })
    }

    fn stub(&self, query: &ComponentQuery) -> Result<Vec<Listing>, AppError> {
        let link = search_url(&self.origin, self.search_path, &[(self.query_param, query.as_str())])?;
        Ok(vec![Listing {
            vendor: self.vendor.to_string(),
            name: format!(
                "{} lookup for \"{query}\" is not automated yet, open the link to search",
                self.vendor
            ),
            link: link.into(),
            price: PENDING.to_string(),
            stock: PENDING.to_string(),
        }])
    }
}

impl SourceAdapter for Placeholder {
    fn vendor(&self) -> &str {
        self.vendor
    }

    fn needs_network(&self) -> bool {
        false
    }

    async fn fetch(&self, query: &ComponentQuery, _headers: &HeaderSet) -> Vec<SourceResult> {
        tracing::debug!(vendor = self.vendor, "Placeholder adapter, no request made");
        into_results(self.vendor, self.stub(query))
    }
}
