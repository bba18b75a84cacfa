use partscout_core::models::{ComponentQuery, Failure, FailureReason, SourceResult};
use partscout_core::pacing::HeaderSet;
use partscout_core::traits::SourceAdapter;

/// A vendor that only publishes a PDF catalog.
///
/// Nothing is fetched. Every query gets the same `ManualLookup` entry with a
/// link to the catalog.
pub struct PdfCatalog {
    vendor: &'static str,
    link: &'static str,
}

impl PdfCatalog {
    pub fn kss() -> Self {
        Self {
            vendor: "KSS",
            link: "https://www.kss.com.tw/filedown.php?file=catalog.pdf&site=dXBsb2FkL3RlY3Bkb3duLzQ4Ny1DUy5wZGY=",
        }
    }
}

impl SourceAdapter for PdfCatalog {
    fn vendor(&self) -> &str {
        self.vendor
    }

    fn needs_network(&self) -> bool {
        false
    }

    async fn fetch(&self, _query: &ComponentQuery, _headers: &HeaderSet) -> Vec<SourceResult> {
        vec![SourceResult::Failure(
            Failure::new(self.vendor, FailureReason::ManualLookup)
                .with_detail("catalog is only published as PDF")
                .with_link(self.link),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_returns_manual_lookup_with_link() {
        let catalog = PdfCatalog::kss();
        for raw in ["M12-5P", "LM317T"] {
            let query = ComponentQuery::parse(raw).unwrap();
            let results = catalog.fetch(&query, &HeaderSet::default()).await;

            assert_eq!(results.len(), 1);
            let SourceResult::Failure(failure) = &results[0] else {
                panic!("expected a failure entry");
            };
            assert_eq!(failure.vendor, "KSS");
            assert_eq!(failure.reason, FailureReason::ManualLookup);
            assert!(failure.link.as_deref().unwrap().starts_with("https://www.kss.com.tw/"));
        }
    }
}
