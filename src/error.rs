// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy for the submission pipeline.
//!
//! `Display` carries full detail for server-side logs. Callers only ever see
//! [`GateError::user_message`].

use crate::notifier::{NotifyError, TransportFailureKind};
use crate::submission::SubmissionOutcome;
use crate::validator::ValidationError;
use axum::http::StatusCode;
use thiserror::Error;

pub const SUCCESS_MESSAGE: &str =
    "Thank you! Your message has been received. We will contact you within 24 hours.";
pub const BOT_MESSAGE: &str = "Thank you for your message.";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const MALFORMED_MESSAGE: &str = "Invalid request data. Please try again.";
pub const SEND_FAILED_MESSAGE: &str =
    "We could not send your message right now. Please try again later.";
pub const UNAVAILABLE_MESSAGE: &str =
    "Our messaging service is temporarily unavailable. Please try again in a few minutes.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed. Please use POST.";

/// Why a submission was not forwarded.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Rate limit exceeded for {identity}")]
    RateLimited { identity: String },

    /// Not an error from the caller's point of view.
    #[error("Automated submission detected")]
    BotDetected,

    #[error("Notifier failed ({kind}): {source}")]
    Transport {
        kind: TransportFailureKind,
        #[source]
        source: NotifyError,
    },

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),
}

impl From<NotifyError> for GateError {
    fn from(source: NotifyError) -> Self {
        GateError::Transport {
            kind: source.kind(),
            source,
        }
    }
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::Validation(_) | GateError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            GateError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GateError::BotDetected => StatusCode::OK,
            GateError::Transport { kind, .. } => match kind {
                TransportFailureKind::Network | TransportFailureKind::Unavailable => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                TransportFailureKind::AuthOrConfig | TransportFailureKind::Unknown => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// The reduced, non-sensitive message shown to the caller.
    pub fn user_message(&self) -> String {
        match self {
            GateError::Validation(err) => err.to_string(),
            GateError::RateLimited { .. } => RATE_LIMITED_MESSAGE.to_string(),
            GateError::BotDetected => BOT_MESSAGE.to_string(),
            GateError::Transport { kind, .. } => match kind {
                TransportFailureKind::Network | TransportFailureKind::Unavailable => {
                    UNAVAILABLE_MESSAGE.to_string()
                }
                TransportFailureKind::AuthOrConfig | TransportFailureKind::Unknown => {
                    SEND_FAILED_MESSAGE.to_string()
                }
            },
            GateError::MalformedRequest(_) => MALFORMED_MESSAGE.to_string(),
        }
    }

    /// Metric label for this kind of outcome.
    pub fn label(&self) -> &'static str {
        match self {
            GateError::Validation(_) => "validation",
            GateError::RateLimited { .. } => "rate_limited",
            GateError::BotDetected => "bot",
            GateError::Transport { .. } => "transport",
            GateError::MalformedRequest(_) => "malformed",
        }
    }

    pub fn into_outcome(self) -> SubmissionOutcome {
        match self {
            GateError::BotDetected => SubmissionOutcome::discarded(BOT_MESSAGE),
            other => SubmissionOutcome::rejected(other.status(), other.user_message()),
        }
    }
}
