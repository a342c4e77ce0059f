// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound notification capability.
//!
//! The gate only knows [`Notifier::send`]. Two implementations ship here:
//! [`HttpMailRelay`] posts messages to a transactional mail relay over HTTP,
//! and [`LogNotifier`] writes them to the log when no relay is configured.

use async_trait::async_trait;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Coarse class of a delivery failure. Used for logging and status mapping;
/// never shown to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFailureKind {
    /// Bad credentials or a misconfigured endpoint
    AuthOrConfig,
    /// DNS failures, timeouts, unreachable hosts
    Network,
    /// The relay refused the connection or reported itself overloaded
    Unavailable,
    Unknown,
}

impl TransportFailureKind {
    /// Classify a free-form transport error message.
    pub fn classify(detail: &str) -> Self {
        let detail = detail.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| detail.contains(n));

        if has(&["invalid login", "authentication", "unauthorized", "credential", "forbidden"]) {
            Self::AuthOrConfig
        } else if has(&["connection refused", "econnrefused", "service unavailable"]) {
            Self::Unavailable
        } else if has(&[
            "not found",
            "enotfound",
            "dns",
            "failed to lookup",
            "timed out",
            "unreachable",
            "network",
        ]) {
            Self::Network
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthOrConfig => "auth_or_config",
            Self::Network => "network",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Mail relay rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail transport timed out after {0:?}")]
    Timeout(Duration),
}

impl NotifyError {
    pub fn kind(&self) -> TransportFailureKind {
        match self {
            NotifyError::Rejected { status, .. } => match status {
                401 | 403 | 400 | 404 | 422 => TransportFailureKind::AuthOrConfig,
                429 | 500..=599 => TransportFailureKind::Unavailable,
                _ => TransportFailureKind::Unknown,
            },
            NotifyError::Transport(detail) => TransportFailureKind::classify(detail),
            NotifyError::Timeout(_) => TransportFailureKind::Network,
        }
    }
}

/// Capability that delivers a notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Wire format expected by the relay.
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Delivers notifications through an HTTP mail relay.
pub struct HttpMailRelay {
    endpoint: String,
    api_key: Option<String>,
    from: String,
    client: reqwest::Client,
}

impl HttpMailRelay {
    pub fn new(endpoint: String, api_key: Option<String>, from: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint,
            api_key,
            from,
            client,
        }
    }
}

#[async_trait]
impl Notifier for HttpMailRelay {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = RelayMessage {
            from: &self.from,
            to: &notification.to,
            subject: &notification.subject,
            html: &notification.html_body,
            text: &notification.text_body,
            reply_to: notification.reply_to.as_deref(),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(error_chain(&e)))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Mail relay accepted message");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            })
        }
    }
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            reply_to = ?notification.reply_to,
            "Mail relay not configured, logging notification"
        );
        debug!(body = %notification.text_body, "Notification body");
        Ok(())
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_substrings() {
        assert_eq!(
            TransportFailureKind::classify("535 Invalid login: bad credentials"),
            TransportFailureKind::AuthOrConfig
        );
        assert_eq!(
            TransportFailureKind::classify("tcp connect error: Connection refused (os error 111)"),
            TransportFailureKind::Unavailable
        );
        assert_eq!(
            TransportFailureKind::classify("getaddrinfo ENOTFOUND smtp.example.com"),
            TransportFailureKind::Network
        );
        assert_eq!(
            TransportFailureKind::classify("something odd"),
            TransportFailureKind::Unknown
        );
    }

    #[test]
    fn test_kind_from_relay_status() {
        let rejected = |status| NotifyError::Rejected {
            status,
            body: String::new(),
        };
        assert_eq!(rejected(401).kind(), TransportFailureKind::AuthOrConfig);
        assert_eq!(rejected(503).kind(), TransportFailureKind::Unavailable);
        assert_eq!(rejected(418).kind(), TransportFailureKind::Unknown);
        assert_eq!(
            NotifyError::Timeout(Duration::from_secs(10)).kind(),
            TransportFailureKind::Network
        );
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notification = Notification {
            to: "owner@example.com".to_string(),
            subject: "Hello".to_string(),
            html_body: "<p>Hi</p>".to_string(),
            text_body: "Hi".to_string(),
            reply_to: None,
        };
        tokio_test::assert_ok!(LogNotifier.send(&notification).await);
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_classified() {
        // Port 9 on loopback is the discard service and is closed on test hosts.
        let relay = HttpMailRelay::new(
            "http://127.0.0.1:9/send".to_string(),
            None,
            "noreply@example.com".to_string(),
            Duration::from_secs(2),
        );
        let notification = Notification {
            to: "owner@example.com".to_string(),
            subject: "Hello".to_string(),
            html_body: String::new(),
            text_body: String::new(),
            reply_to: None,
        };
        let err = relay.send(&notification).await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
        assert_ne!(err.kind(), TransportFailureKind::AuthOrConfig);
    }
}
