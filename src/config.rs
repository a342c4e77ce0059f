// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact gate.
//!
//! Every knob is read from the environment (optionally via a `.env` file).
//! Policy values that differ between deployments (phone/message requirement,
//! timestamp strictness) are plain configuration; none is hardwired.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    MustBePositive { key: &'static str },

    #[error("{min_key} ({min}) exceeds {max_key} ({max})")]
    LengthBounds {
        min_key: &'static str,
        max_key: &'static str,
        min: usize,
        max: usize,
    },
}

/// Configuration for the contact gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Submission acceptance policy
    #[serde(default)]
    pub policy: SubmissionPolicy,

    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Cross-origin configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limiting per identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum accepted-for-checking requests per window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between sweeps of expired records in seconds (default: 3600)
    #[serde(default = "default_sweep_secs")]
    pub sweep_interval_secs: u64,
}

/// Which fields are required and how strictly they are bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPolicy {
    #[serde(default)]
    pub require_phone: bool,

    #[serde(default = "default_true")]
    pub require_message: bool,

    #[serde(default = "default_min_name_len")]
    pub min_name_len: usize,

    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    #[serde(default = "default_min_message_len")]
    pub min_message_len: usize,

    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Cut over-long messages down instead of rejecting them
    #[serde(default)]
    pub truncate_message: bool,

    /// Maximum |now - client timestamp| in seconds (default: 1800)
    #[serde(default = "default_max_skew_secs")]
    pub max_timestamp_skew_secs: u64,

    /// Reject submissions that carry no client timestamp
    #[serde(default)]
    pub timestamp_required: bool,
}

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// HTTP mail relay endpoint. When unset, submissions are only logged.
    #[serde(default)]
    pub relay_url: Option<String>,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_from")]
    pub from: String,

    /// Destination for owner notifications
    #[serde(default = "default_to")]
    pub to: String,

    /// Send an acknowledgement to the submitter after the primary send
    #[serde(default = "default_true")]
    pub send_acknowledgement: bool,

    #[serde(default = "default_mail_timeout_secs")]
    pub timeout_secs: u64,
}

/// Cross-origin settings for the contact endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_sweep_secs() -> u64 {
    60 * 60
}

fn default_min_name_len() -> usize {
    2
}

fn default_max_name_len() -> usize {
    50
}

fn default_min_message_len() -> usize {
    10
}

fn default_max_message_len() -> usize {
    500
}

fn default_max_skew_secs() -> u64 {
    30 * 60
}

fn default_from() -> String {
    "noreply@localhost".to_string()
}

fn default_to() -> String {
    "contact@localhost".to_string()
}

fn default_mail_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            policy: SubmissionPolicy::default(),
            mail: MailConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_secs(),
        }
    }
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            require_phone: false,
            require_message: default_true(),
            min_name_len: default_min_name_len(),
            max_name_len: default_max_name_len(),
            min_message_len: default_min_message_len(),
            max_message_len: default_max_message_len(),
            truncate_message: false,
            max_timestamp_skew_secs: default_max_skew_secs(),
            timestamp_required: false,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            api_key: None,
            from: default_from(),
            to: default_to(),
            send_acknowledgement: default_true(),
            timeout_secs: default_mail_timeout_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl SubmissionPolicy {
    pub fn max_timestamp_skew(&self) -> Duration {
        Duration::from_secs(self.max_timestamp_skew_secs)
    }
}

impl MailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    /// when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&get, "RATE_LIMIT_MAX", defaults.rate_limit.max_requests)?,
            window_secs: parse_or(
                &get,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit.window_secs,
            )?,
            sweep_interval_secs: parse_or(
                &get,
                "RATE_LIMIT_SWEEP_SECS",
                defaults.rate_limit.sweep_interval_secs,
            )?,
        };
        if rate_limit.max_requests == 0 {
            return Err(ConfigError::MustBePositive { key: "RATE_LIMIT_MAX" });
        }
        if rate_limit.window_secs == 0 {
            return Err(ConfigError::MustBePositive {
                key: "RATE_LIMIT_WINDOW_SECS",
            });
        }
        if rate_limit.sweep_interval_secs == 0 {
            return Err(ConfigError::MustBePositive {
                key: "RATE_LIMIT_SWEEP_SECS",
            });
        }

        let p = &defaults.policy;
        let policy = SubmissionPolicy {
            require_phone: parse_bool_or(&get, "REQUIRE_PHONE", p.require_phone)?,
            require_message: parse_bool_or(&get, "REQUIRE_MESSAGE", p.require_message)?,
            min_name_len: parse_or(&get, "MIN_NAME_LEN", p.min_name_len)?,
            max_name_len: parse_or(&get, "MAX_NAME_LEN", p.max_name_len)?,
            min_message_len: parse_or(&get, "MIN_MESSAGE_LEN", p.min_message_len)?,
            max_message_len: parse_or(&get, "MAX_MESSAGE_LEN", p.max_message_len)?,
            truncate_message: parse_bool_or(&get, "TRUNCATE_MESSAGE", p.truncate_message)?,
            max_timestamp_skew_secs: parse_or(
                &get,
                "MAX_TIMESTAMP_SKEW_SECS",
                p.max_timestamp_skew_secs,
            )?,
            timestamp_required: parse_bool_or(
                &get,
                "TIMESTAMP_REQUIRED",
                p.timestamp_required,
            )?,
        };
        if policy.min_name_len > policy.max_name_len {
            return Err(ConfigError::LengthBounds {
                min_key: "MIN_NAME_LEN",
                max_key: "MAX_NAME_LEN",
                min: policy.min_name_len,
                max: policy.max_name_len,
            });
        }
        if policy.min_message_len > policy.max_message_len {
            return Err(ConfigError::LengthBounds {
                min_key: "MIN_MESSAGE_LEN",
                max_key: "MAX_MESSAGE_LEN",
                min: policy.min_message_len,
                max: policy.max_message_len,
            });
        }

        let m = &defaults.mail;
        let mail = MailConfig {
            relay_url: get("MAIL_RELAY_URL"),
            api_key: get("MAIL_RELAY_API_KEY"),
            from: get("MAIL_FROM").unwrap_or_else(|| m.from.clone()),
            to: get("MAIL_TO").unwrap_or_else(|| m.to.clone()),
            send_acknowledgement: parse_bool_or(
                &get,
                "MAIL_SEND_ACKNOWLEDGEMENT",
                m.send_acknowledgement,
            )?,
            timeout_secs: parse_or(&get, "MAIL_TIMEOUT_SECS", m.timeout_secs)?,
        };

        let cors = CorsConfig {
            allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };

        let metrics = MetricsConfig {
            enabled: parse_bool_or(&get, "METRICS_ENABLED", defaults.metrics.enabled)?,
            ..defaults.metrics.clone()
        };

        Ok(Config {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rate_limit,
            policy,
            mail,
            cors,
            metrics,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
        None => Ok(default),
    }
}
