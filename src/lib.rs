// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gate
//!
//! This crate guards a website contact form endpoint before submissions are
//! relayed by email:
//!
//! - Per-identity fixed-window rate limiting (5 per 15 minutes by default)
//! - Honeypot fields that silently discard bot traffic
//! - Client timestamp freshness checks (lenient or strict)
//! - Field validation with configurable phone/message requirements
//! - Sanitization of free text before it reaches the mail template
//! - Delivery through an HTTP mail relay with a bounded timeout

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod notifier;
pub mod sanitize;
pub mod submission;
pub mod template;
pub mod validator;

pub use config::Config;
pub use gate::SubmissionGate;
pub use limiter::{InMemoryRateStore, RateLimitResult, RateLimitStore, RateLimiter, RateRecord};
pub use notifier::{Notification, Notifier, NotifyError};
pub use submission::{SubmissionOutcome, SubmissionRequest};
pub use validator::{SubmissionValidator, ValidationError};

use std::sync::Arc;

/// Pick the notifier for a configuration: the HTTP relay when one is
/// configured, otherwise log-only delivery.
pub fn build_notifier(config: &config::MailConfig) -> Arc<dyn Notifier> {
    match &config.relay_url {
        Some(url) => Arc::new(notifier::HttpMailRelay::new(
            url.clone(),
            config.api_key.clone(),
            config.from.clone(),
            config.timeout(),
        )),
        None => Arc::new(notifier::LogNotifier),
    }
}
