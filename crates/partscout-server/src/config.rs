use std::time::Duration;

use partscout_core::AppError;
use partscout_core::DEFAULT_MAX_BLOCK_CHARS;
use partscout_core::pacing::PacingConfig;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";

/// Runtime configuration for the webhook server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub channel_secret: String,
    pub access_token: String,
    pub line_api_base_url: String,
    pub max_block_chars: usize,
    pub pacing: PacingConfig,
}

impl ServerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `LINE_CHANNEL_SECRET` (required)
    /// - `LINE_CHANNEL_ACCESS_TOKEN` (required)
    /// - `PORT` (optional, defaults to 5000)
    /// - `LINE_API_BASE_URL` (optional, defaults to https://api.line.me)
    /// - `PARTSCOUT_MAX_BLOCK_CHARS` (optional, defaults to 1800)
    /// - `PARTSCOUT_DELAY_MIN_MS` / `PARTSCOUT_DELAY_MAX_MS` (optional, 2000 / 5000)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let channel_secret = required(&lookup, "LINE_CHANNEL_SECRET")?;
        let access_token = required(&lookup, "LINE_CHANNEL_ACCESS_TOKEN")?;

        let port = parsed(&lookup, "PORT", DEFAULT_PORT)?;
        let line_api_base_url = lookup("LINE_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_LINE_API_BASE_URL.to_string());

        let max_block_chars = parsed(&lookup, "PARTSCOUT_MAX_BLOCK_CHARS", DEFAULT_MAX_BLOCK_CHARS)?;
        if max_block_chars == 0 {
            return Err(AppError::ConfigError(
                "PARTSCOUT_MAX_BLOCK_CHARS must be at least 1".into(),
            ));
        }

        let defaults = PacingConfig::default();
        let min_ms = parsed(
            &lookup,
            "PARTSCOUT_DELAY_MIN_MS",
            defaults.min_delay.as_millis() as u64,
        )?;
        let max_ms = parsed(
            &lookup,
            "PARTSCOUT_DELAY_MAX_MS",
            defaults.max_delay.as_millis() as u64,
        )?;
        let pacing = PacingConfig::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms));
        pacing.validate()?;

        Ok(Self {
            port,
            channel_secret,
            access_token,
            line_api_base_url,
            max_block_chars,
            pacing,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::ConfigError(format!("{key} not set. Required for the LINE webhook.")))
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!("Invalid {key} '{raw}': must be a non-negative integer"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, AppError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    const CREDENTIALS: [(&str, &str); 2] = [
        ("LINE_CHANNEL_SECRET", "secret"),
        ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
    ];

    #[test]
    fn defaults_apply() {
        let cfg = config(&CREDENTIALS).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.line_api_base_url, "https://api.line.me");
        assert_eq!(cfg.max_block_chars, 1800);
        assert_eq!(cfg.pacing.min_delay, Duration::from_secs(2));
        assert_eq!(cfg.pacing.max_delay, Duration::from_secs(5));
    }

    #[test]
    fn missing_secret_is_config_error() {
        let err = config(&[("LINE_CHANNEL_ACCESS_TOKEN", "token")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(ref m) if m.contains("LINE_CHANNEL_SECRET")));
    }

    #[test]
    fn overrides_are_read() {
        let mut vars = CREDENTIALS.to_vec();
        vars.extend([
            ("PORT", "8080"),
            ("PARTSCOUT_MAX_BLOCK_CHARS", "500"),
            ("PARTSCOUT_DELAY_MIN_MS", "0"),
            ("PARTSCOUT_DELAY_MAX_MS", "10"),
        ]);
        let cfg = config(&vars).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.max_block_chars, 500);
        assert_eq!(cfg.pacing.max_delay, Duration::from_millis(10));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut vars = CREDENTIALS.to_vec();
        vars.push(("PORT", "http"));
        assert!(matches!(config(&vars), Err(AppError::ConfigError(_))));

        let mut vars = CREDENTIALS.to_vec();
        vars.push(("PARTSCOUT_MAX_BLOCK_CHARS", "0"));
        assert!(matches!(config(&vars), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn inverted_delay_range_is_rejected() {
        let mut vars = CREDENTIALS.to_vec();
        vars.extend([("PARTSCOUT_DELAY_MIN_MS", "5000"), ("PARTSCOUT_DELAY_MAX_MS", "100")]);
        assert!(config(&vars).is_err());
    }
}
