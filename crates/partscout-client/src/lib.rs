pub mod fetcher;
pub mod line;
pub mod vendors;

pub use fetcher::ReqwestFetcher;
pub use line::LineMessenger;
pub use vendors::{VendorAdapter, build_aggregator, default_vendors};
