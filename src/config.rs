use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const DEFAULT_DATA_DIR: &str = ".estate-hub";
const DEFAULT_REPLY_DELAY_MIN_MS: u64 = 2_000;
const DEFAULT_REPLY_DELAY_MAX_MS: u64 = 5_000;
const DEFAULT_GEOCODE_INTERVAL_MS: u64 = 1_000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Keys for the external inference services. A missing key puts the
/// matching adapter in fallback-only mode.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub google_vision: Option<String>,
    pub huggingface: Option<String>,
    pub groq: Option<String>,
}

/// Runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub api_keys: ApiKeys,
    pub reply_delay_min: Duration,
    pub reply_delay_max: Duration,
    pub geocode_min_interval: Duration,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let millis = |key: &str, default: u64| {
            Duration::from_millis(parse_or_default(key, non_empty(key), default))
        };

        let mut reply_delay_min = millis("ESTATE_REPLY_DELAY_MIN_MS", DEFAULT_REPLY_DELAY_MIN_MS);
        let mut reply_delay_max = millis("ESTATE_REPLY_DELAY_MAX_MS", DEFAULT_REPLY_DELAY_MAX_MS);
        if reply_delay_min > reply_delay_max {
            warn!(
                "Reply delay min {:?} exceeds max {:?}, using defaults",
                reply_delay_min, reply_delay_max
            );
            reply_delay_min = Duration::from_millis(DEFAULT_REPLY_DELAY_MIN_MS);
            reply_delay_max = Duration::from_millis(DEFAULT_REPLY_DELAY_MAX_MS);
        }

        Self {
            data_dir: non_empty("ESTATE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            api_keys: ApiKeys {
                google_vision: non_empty("GOOGLE_VISION_API_KEY"),
                huggingface: non_empty("HUGGINGFACE_API_TOKEN"),
                groq: non_empty("GROQ_API_KEY"),
            },
            reply_delay_min,
            reply_delay_max,
            geocode_min_interval: millis("ESTATE_GEOCODE_INTERVAL_MS", DEFAULT_GEOCODE_INTERVAL_MS),
            http_timeout: Duration::from_secs(parse_or_default(
                "ESTATE_HTTP_TIMEOUT_SECS",
                non_empty("ESTATE_HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
        }
    }
}

fn parse_or_default(key: &str, raw: Option<String>, default: u64) -> u64 {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value {:?} for {}, using {}", value, key, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_dir, PathBuf::from(".estate-hub"));
        assert_eq!(config.reply_delay_min, Duration::from_secs(2));
        assert_eq!(config.reply_delay_max, Duration::from_secs(5));
        assert_eq!(config.geocode_min_interval, Duration::from_secs(1));
        assert!(config.api_keys.groq.is_none());
    }

    #[test]
    fn reads_keys_and_overrides() {
        let config = config_from(&[
            ("ESTATE_DATA_DIR", "/tmp/estate"),
            ("GROQ_API_KEY", "gsk_test"),
            ("GOOGLE_VISION_API_KEY", "   "),
            ("ESTATE_REPLY_DELAY_MIN_MS", "100"),
            ("ESTATE_REPLY_DELAY_MAX_MS", "200"),
        ]);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/estate"));
        assert_eq!(config.api_keys.groq.as_deref(), Some("gsk_test"));
        assert!(config.api_keys.google_vision.is_none());
        assert_eq!(config.reply_delay_min, Duration::from_millis(100));
        assert_eq!(config.reply_delay_max, Duration::from_millis(200));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = config_from(&[
            ("ESTATE_HTTP_TIMEOUT_SECS", "soon"),
            ("ESTATE_REPLY_DELAY_MIN_MS", "9000"),
            ("ESTATE_REPLY_DELAY_MAX_MS", "1000"),
        ]);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.reply_delay_min, Duration::from_secs(2));
        assert_eq!(config.reply_delay_max, Duration::from_secs(5));
    }
}
