//! Runtime configuration, read from `FOODSHED_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use foodshed_catalog::ReferencePolicy;
use foodshed_observability::LogFormat;

pub const ENV_BIND_ADDR: &str = "FOODSHED_BIND_ADDR";
pub const ENV_DATA_DIR: &str = "FOODSHED_DATA_DIR";
pub const ENV_REFERENCE_POLICY: &str = "FOODSHED_REFERENCE_POLICY";
pub const ENV_LOCAL_THRESHOLD_MILES: &str = "FOODSHED_LOCAL_THRESHOLD_MILES";
pub const ENV_SEED_SAMPLE: &str = "FOODSHED_SEED_SAMPLE";
pub const ENV_LOG_FORMAT: &str = "FOODSHED_LOG_FORMAT";

pub const DEFAULT_LOCAL_THRESHOLD_MILES: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// CSV data directory; `None` keeps the catalog in memory.
    pub data_dir: Option<PathBuf>,
    pub reference_policy: ReferencePolicy,
    /// Radius used by the dashboard's "local producers" metric.
    pub local_threshold_miles: f64,
    /// Populate an in-memory catalog with the sample dataset on startup.
    pub seed_sample: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: None,
            reference_policy: ReferencePolicy::Reject,
            local_threshold_miles: DEFAULT_LOCAL_THRESHOLD_MILES,
            seed_sample: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Malformed values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let local_threshold_miles = parse_or(
            &lookup,
            ENV_LOCAL_THRESHOLD_MILES,
            defaults.local_threshold_miles,
        );
        let local_threshold_miles =
            if local_threshold_miles.is_finite() && local_threshold_miles >= 0.0 {
                local_threshold_miles
            } else {
                tracing::warn!(
                    key = ENV_LOCAL_THRESHOLD_MILES,
                    "threshold must be non-negative; using default"
                );
                defaults.local_threshold_miles
            };

        Self {
            bind_addr: parse_or(&lookup, ENV_BIND_ADDR, defaults.bind_addr),
            data_dir: lookup(ENV_DATA_DIR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            reference_policy: parse_or(&lookup, ENV_REFERENCE_POLICY, defaults.reference_policy),
            local_threshold_miles,
            seed_sample: parse_bool_or(&lookup, ENV_SEED_SAMPLE, defaults.seed_sample),
        }
    }
}

/// Log format is needed before the rest of the config can log its warnings.
pub fn log_format_from_env() -> LogFormat {
    std::env::var(ENV_LOG_FORMAT)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    error = %e,
                    "invalid config value; using default"
                );
                default
            }
        },
    }
}

fn parse_bool_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => default,
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, value = %v, "invalid boolean config value; using default");
                default
            }
        },
    }
}
