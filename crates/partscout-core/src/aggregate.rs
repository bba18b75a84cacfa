use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::models::{
    AggregateResult, ComponentQuery, Failure, FailureReason, MAX_LISTINGS_PER_VENDOR,
    SourceResult,
};
use crate::pacing::{HeaderSet, PacingController};
use crate::traits::SourceAdapter;

/// Runs every vendor adapter for a query and merges their results.
///
/// Adapters run one after another in the order given at construction, with
/// pacing delays between networked ones. The catalog adapter always runs
/// last. Generic over the adapter type so tests can inject mocks.
pub struct Aggregator<A>
where
    A: SourceAdapter,
{
    adapters: Vec<A>,
    catalog: A,
    pacing: PacingController,
}

impl<A> Aggregator<A>
where
    A: SourceAdapter,
{
    /// `adapters` are queried in priority order; `catalog` is appended last
    /// regardless of how the others fare.
    pub fn new(adapters: Vec<A>, catalog: A, pacing: PacingController) -> Self {
        Self {
            adapters,
            catalog,
            pacing,
        }
    }

    /// Vendor names in output order, catalog included.
    pub fn vendors(&self) -> Vec<&str> {
        self.adapters
            .iter()
            .chain(std::iter::once(&self.catalog))
            .map(|a| a.vendor())
            .collect()
    }

    /// Query every vendor. Never fails; the result is never empty.
    pub async fn search(&self, query: &ComponentQuery) -> AggregateResult {
        tracing::info!(query = %query, vendors = self.adapters.len() + 1, "Searching vendors");

        let mut session = self.pacing.session();
        let mut aggregate = AggregateResult::new(query);
        let mut previous_networked = false;

        for (index, adapter) in self.adapters.iter().enumerate() {
            if adapter.needs_network() {
                if previous_networked {
                    session.pause().await;
                }
                previous_networked = true;
            }
            let headers = session.next(index);
            let results = run_isolated(adapter, query, &headers).await;
            aggregate.results.extend(results);
        }

        let headers = session.next(self.adapters.len());
        let catalog = run_isolated(&self.catalog, query, &headers).await;
        aggregate.results.extend(catalog);

        tracing::info!(
            query = %query,
            entries = aggregate.len(),
            listings = aggregate.listing_count(),
            "Search complete"
        );
        aggregate
    }
}

/// Call one adapter so that nothing it does can affect the others.
async fn run_isolated<A: SourceAdapter>(
    adapter: &A,
    query: &ComponentQuery,
    headers: &HeaderSet,
) -> Vec<SourceResult> {
    let vendor = adapter.vendor();
    tracing::debug!(vendor, "Dispatching vendor lookup");

    match AssertUnwindSafe(adapter.fetch(query, headers))
        .catch_unwind()
        .await
    {
        Ok(results) => enforce_contract(vendor, results),
        Err(_) => {
            tracing::error!(vendor, "Vendor adapter panicked");
            vec![SourceResult::Failure(
                Failure::new(vendor, FailureReason::ParseError).with_detail("adapter crashed"),
            )]
        }
    }
}

/// Listings only, at most [`MAX_LISTINGS_PER_VENDOR`] of them, or exactly one
/// failure. An empty answer counts as `NotFound` so every vendor shows up.
fn enforce_contract(vendor: &str, results: Vec<SourceResult>) -> Vec<SourceResult> {
    if results.is_empty() {
        return vec![SourceResult::Failure(Failure::new(
            vendor,
            FailureReason::NotFound,
        ))];
    }
    if let Some(failure) = results.iter().find(|r| r.is_failure()) {
        if results.len() > 1 {
            tracing::warn!(vendor, count = results.len(), "Adapter mixed failure with other results");
        }
        return vec![failure.clone()];
    }
    results.into_iter().take(MAX_LISTINGS_PER_VENDOR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::PacingConfig;
    use crate::testutil::*;

    fn aggregator(adapters: Vec<MockAdapter>) -> Aggregator<MockAdapter> {
        Aggregator::new(
            adapters,
            MockAdapter::catalog("KSS"),
            PacingController::new(PacingConfig::disabled()),
        )
    }

    fn query(text: &str) -> ComponentQuery {
        ComponentQuery::parse(text).unwrap()
    }

    #[tokio::test]
    async fn results_follow_vendor_order_and_catalog_is_last() {
        let agg = aggregator(vec![
            MockAdapter::with_listings("RS Components", 2),
            MockAdapter::failing("WAGO", FailureReason::NetworkError),
            MockAdapter::with_listings("Digi-Key", 1),
        ]);

        let result = agg.search(&query("M12-5P")).await;

        let vendors: Vec<_> = result.iter().map(|r| r.vendor()).collect();
        assert_eq!(
            vendors,
            vec!["RS Components", "RS Components", "WAGO", "Digi-Key", "KSS"]
        );
        assert_eq!(result.query, "M12-5P");
        assert_eq!(
            result.results.last().and_then(|r| r.failure_reason()),
            Some(FailureReason::ManualLookup)
        );
    }

    #[tokio::test]
    async fn all_not_found_yields_one_failure_per_vendor_plus_catalog() {
        let names = ["RS Components", "WAGO", "Octopart"];
        let agg = aggregator(
            names
                .iter()
                .map(|n| MockAdapter::failing(n, FailureReason::NotFound))
                .collect(),
        );

        let result = agg.search(&query("M12-5P")).await;

        assert_eq!(result.len(), names.len() + 1);
        for (entry, name) in result.iter().zip(names) {
            assert_eq!(entry.vendor(), name);
            assert_eq!(entry.failure_reason(), Some(FailureReason::NotFound));
        }
        assert_eq!(result.results[3].vendor(), "KSS");
    }

    #[tokio::test]
    async fn panicking_adapter_does_not_affect_others() {
        let after = MockAdapter::with_listings("WAGO", 1);
        let agg = aggregator(vec![MockAdapter::panicking("RS Components"), after.clone()]);

        let result = agg.search(&query("M12")).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result.results[0].vendor(), "RS Components");
        assert_eq!(
            result.results[0].failure_reason(),
            Some(FailureReason::ParseError)
        );
        assert!(!result.results[1].is_failure());
        assert_eq!(after.calls(), 1);
    }

    #[tokio::test]
    async fn empty_adapter_output_becomes_not_found() {
        let agg = aggregator(vec![MockAdapter::with_results("WAGO", vec![])]);

        let result = agg.search(&query("M12")).await;

        assert_eq!(
            result.results[0].failure_reason(),
            Some(FailureReason::NotFound)
        );
    }

    #[tokio::test]
    async fn listings_are_capped_per_vendor() {
        let agg = aggregator(vec![MockAdapter::with_listings("RS Components", 7)]);

        let result = agg.search(&query("M12")).await;

        assert_eq!(result.listing_count(), MAX_LISTINGS_PER_VENDOR);
        assert_eq!(result.len(), MAX_LISTINGS_PER_VENDOR + 1);
    }

    #[tokio::test]
    async fn mixed_output_keeps_only_the_failure() {
        let mut results = mock_listings("Mouser", 2);
        results.push(SourceResult::Failure(Failure::new(
            "Mouser",
            FailureReason::ParseError,
        )));
        let agg = aggregator(vec![MockAdapter::with_results("Mouser", results)]);

        let result = agg.search(&query("M12")).await;

        assert_eq!(result.len(), 2);
        assert_eq!(
            result.results[0].failure_reason(),
            Some(FailureReason::ParseError)
        );
    }

    #[tokio::test]
    async fn every_adapter_sees_the_query_and_headers() {
        let rs = MockAdapter::with_listings("RS Components", 1);
        let agg = aggregator(vec![rs.clone()]);

        agg.search(&query("  LM317T ")).await;

        let seen = rs.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "LM317T");
        assert!(seen[0].1.user_agent.starts_with("Mozilla/5.0"));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_only_between_networked_adapters() {
        let pacing = PacingController::new(PacingConfig::new(
            std::time::Duration::from_secs(2),
            std::time::Duration::from_secs(2),
        ));
        let agg = Aggregator::new(
            vec![
                MockAdapter::with_listings("RS Components", 1),
                MockAdapter::with_listings("WAGO", 1),
                MockAdapter::offline("Digi-Key"),
                MockAdapter::offline("Mouser"),
                MockAdapter::with_listings("Octopart", 1),
            ],
            MockAdapter::catalog("KSS"),
            pacing,
        );

        let start = tokio::time::Instant::now();
        agg.search(&query("M12")).await;
        let elapsed = start.elapsed();

        // RS -> WAGO and WAGO -> Octopart; nothing around offline adapters.
        assert_eq!(elapsed.as_secs(), 4, "elapsed: {elapsed:?}");
    }

    #[test]
    fn vendors_lists_catalog_last() {
        let agg = aggregator(vec![
            MockAdapter::with_listings("RS Components", 1),
            MockAdapter::with_listings("WAGO", 1),
        ]);
        assert_eq!(agg.vendors(), vec!["RS Components", "WAGO", "KSS"]);
    }
}
