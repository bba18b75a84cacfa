//! Request pacing and browser identity for polite vendor scraping.
//!
//! A [`PacingController`] is built once from a [`PacingConfig`] and handed to
//! the aggregator. Every query opens its own [`PacingSession`], which owns the
//! RNG used for user-agent selection and inter-request delays, so concurrent
//! queries never share mutable state.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use partscout_core::pacing::{IdentityPolicy, PacingConfig, PacingController};
//!
//! let config = PacingConfig::new(Duration::from_secs(2), Duration::from_secs(5))
//!     .with_identity(IdentityPolicy::PerCall)
//!     .with_seed(7);
//! let controller = PacingController::new(config);
//! let mut session = controller.session();
//! let headers = session.next(0);
//! assert!(headers.user_agent.starts_with("Mozilla/5.0"));
//! let delay = session.delay_before_next();
//! assert!(delay >= Duration::from_secs(2) && delay <= Duration::from_secs(5));
//! ```

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::AppError;
use crate::traits::Page;

/// Desktop browser User-Agent strings to rotate through.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7";
const ACCEPT_ENCODING: &str = "gzip, deflate, br";
const CONNECTION: &str = "keep-alive";

/// Markers that betray an anti-bot interstitial in a response body.
const BODY_MARKERS: &[&str] = &[
    "recaptcha",
    "captcha",
    "verify you are human",
    "are you a robot",
];

/// Markers in the final URL, i.e. after being redirected to a check page.
const URL_MARKERS: &[&str] = &["captcha", "verify", "challenge"];

/// Headers attached to every outbound vendor request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub accept_encoding: String,
    pub connection: String,
}

impl HeaderSet {
    /// The standard browser bundle with the given User-Agent.
    pub fn for_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            accept: ACCEPT.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
            accept_encoding: ACCEPT_ENCODING.to_string(),
            connection: CONNECTION.to_string(),
        }
    }

    /// Header name/value pairs, ready to put on a request.
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("User-Agent", self.user_agent.as_str()),
            ("Accept", self.accept.as_str()),
            ("Accept-Language", self.accept_language.as_str()),
            ("Accept-Encoding", self.accept_encoding.as_str()),
            ("Connection", self.connection.as_str()),
        ]
    }
}

impl Default for HeaderSet {
    fn default() -> Self {
        Self::for_agent(USER_AGENTS[0])
    }
}

/// How often the User-Agent changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityPolicy {
    /// One identity for every vendor of a query, like a single browsing session.
    #[default]
    PerQuery,
    /// A fresh identity for every vendor request.
    PerCall,
}

/// Configuration for the pacing controller.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Lower bound of the delay between two networked vendor requests.
    pub min_delay: Duration,

    /// Upper bound of that delay (inclusive).
    pub max_delay: Duration,

    pub identity: IdentityPolicy,

    /// Fixed RNG seed. Every session then replays the same identities and
    /// delays, which keeps tests deterministic.
    pub seed: Option<u64>,
}

impl PacingConfig {
    /// Delays drawn uniformly from `[min_delay, max_delay]`.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            identity: IdentityPolicy::PerQuery,
            seed: None,
        }
    }

    /// No delays at all. Identity rotation still applies.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_identity(mut self, identity: IdentityPolicy) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_delay > self.max_delay {
            return Err(AppError::ConfigError(format!(
                "pacing min delay ({}ms) exceeds max delay ({}ms)",
                self.min_delay.as_millis(),
                self.max_delay.as_millis()
            )));
        }
        Ok(())
    }
}

impl Default for PacingConfig {
    /// 2 to 5 seconds between vendors, one identity per query.
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(5))
    }
}

/// Hands out per-query pacing sessions.
#[derive(Debug, Clone, Default)]
pub struct PacingController {
    config: PacingConfig,
}

impl PacingController {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// Start pacing for one query.
    pub fn session(&self) -> PacingSession {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let query_agent = pick_agent(&mut rng);
        PacingSession {
            config: self.config.clone(),
            rng,
            query_agent,
        }
    }
}

/// Pacing state for a single query.
pub struct PacingSession {
    config: PacingConfig,
    rng: StdRng,
    query_agent: &'static str,
}

impl PacingSession {
    /// Headers for the request about to be made to the vendor at `vendor_index`.
    pub fn next(&mut self, vendor_index: usize) -> HeaderSet {
        let agent = match self.config.identity {
            IdentityPolicy::PerQuery => self.query_agent,
            IdentityPolicy::PerCall => pick_agent(&mut self.rng),
        };
        tracing::debug!(vendor_index, user_agent = %agent, "Selected request identity");
        HeaderSet::for_agent(agent)
    }

    /// Draw the wait to take before the next networked vendor.
    pub fn delay_before_next(&mut self) -> Duration {
        let min = self.config.min_delay.as_millis() as u64;
        let max = self.config.max_delay.as_millis() as u64;
        if max <= min {
            return self.config.min_delay;
        }
        Duration::from_millis(self.rng.gen_range(min..=max))
    }

    /// Sleep for a freshly drawn delay.
    pub async fn pause(&mut self) {
        let delay = self.delay_before_next();
        if delay.is_zero() {
            return;
        }
        tracing::debug!(delay_ms = %delay.as_millis(), "Pacing before next vendor");
        tokio::time::sleep(delay).await;
    }
}

fn pick_agent(rng: &mut StdRng) -> &'static str {
    USER_AGENTS
        .choose(rng)
        .copied()
        // USER_AGENTS is a non-empty const slice
        .unwrap_or(USER_AGENTS[0])
}

/// Return the anti-bot marker found in the final URL or body, if any.
///
/// Matching is a case-insensitive substring search.
pub fn detect_block(final_url: &str, body: &str) -> Option<&'static str> {
    // The query string echoes the user's search term; only the location counts.
    let location = final_url.split('?').next().unwrap_or_default();
    let location = location.to_ascii_lowercase();
    if let Some(marker) = URL_MARKERS.iter().find(|m| location.contains(*m)) {
        return Some(*marker);
    }
    let body = body.to_ascii_lowercase();
    BODY_MARKERS.iter().find(|m| body.contains(*m)).copied()
}

/// Check a fetched page before any parsing is attempted.
///
/// Anti-bot pages are reported as [`AppError::Blocked`] even when they come
/// with an error status; otherwise non-2xx statuses become
/// [`AppError::HttpStatus`]. On success the body is returned.
pub fn ensure_usable(page: &Page) -> Result<&str, AppError> {
    if let Some(marker) = detect_block(&page.final_url, &page.body) {
        tracing::warn!(url = %page.final_url, marker, "Anti-bot page detected");
        return Err(AppError::Blocked(marker.to_string()));
    }
    if !page.is_success() {
        return Err(AppError::HttpStatus {
            status: page.status,
            url: page.final_url.clone(),
        });
    }
    Ok(&page.body)
}
