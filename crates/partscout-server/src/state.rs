use partscout_client::{LineMessenger, ReqwestFetcher, VendorAdapter, build_aggregator};
use partscout_core::pacing::PacingController;
use partscout_core::{AppError, QueryResponder};

use crate::config::ServerConfig;

pub type Responder = QueryResponder<VendorAdapter<ReqwestFetcher>>;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub responder: Responder,
    pub messenger: LineMessenger,
    /// Key for checking `X-Line-Signature`.
    pub channel_secret: String,
}

impl AppState {
    /// Wire the default vendor registry and the LINE client from config.
    pub fn from_config(config: &ServerConfig) -> Result<Self, AppError> {
        let aggregator = build_aggregator(
            ReqwestFetcher::new()?,
            PacingController::new(config.pacing.clone()),
        )?;
        let messenger =
            LineMessenger::with_base_url(&config.access_token, &config.line_api_base_url)?;

        Ok(Self {
            responder: QueryResponder::new(aggregator).with_max_block_size(config.max_block_chars),
            messenger,
            channel_secret: config.channel_secret.clone(),
        })
    }
}
