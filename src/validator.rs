// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact submission validator.
//!
//! Checks run in a fixed order and stop at the first failure:
//! - Session freshness (client timestamp skew)
//! - Name presence and length
//! - Email shape
//! - Phone shape (required or optional by policy)
//! - Message presence and length (required or optional by policy)
//!
//! Free text is sanitized before it is measured, so the values handed on
//! are exactly the values that passed. An email address the sanitizer would
//! alter is rejected outright.
//!
//! Error messages are shown to the caller verbatim, so they never carry
//! anything beyond which field is wrong.

use crate::config::SubmissionPolicy;
use crate::sanitize::sanitize_text;
use crate::submission::{SubmissionRequest, TimestampValue};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static PHONE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9][0-9]{8,14}$").expect("valid regex"));

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your {0}.")]
    MissingField(&'static str),

    #[error("Your {field} must be at least {min} characters.")]
    TooShort { field: &'static str, min: usize },

    #[error("Your {field} must be at most {max} characters.")]
    TooLong { field: &'static str, max: usize },

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Please enter a valid phone number.")]
    InvalidPhone,

    #[error("Your session has expired. Please refresh the page and try again.")]
    SessionExpired,

    #[error("Your session could not be verified. Please refresh the page and try again.")]
    MissingTimestamp,
}

/// Trimmed, sanitized field values that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// Contact submission validator.
pub struct SubmissionValidator {
    policy: SubmissionPolicy,
}

impl SubmissionValidator {
    /// Create a new validator with the given policy.
    pub fn new(policy: SubmissionPolicy) -> Self {
        Self { policy }
    }

    /// Check the client timestamp against `now`.
    pub fn check_freshness(
        &self,
        timestamp: TimestampValue,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        match timestamp {
            TimestampValue::Absent if self.policy.timestamp_required => {
                debug!("Client timestamp missing under strict policy");
                Err(ValidationError::MissingTimestamp)
            }
            TimestampValue::Absent => Ok(()),
            TimestampValue::Unreadable => {
                debug!("Client timestamp unreadable");
                Err(ValidationError::SessionExpired)
            }
            TimestampValue::At(at) => {
                let skew_ms = (now - at).num_milliseconds().saturating_abs();
                let max_ms =
                    i64::try_from(self.policy.max_timestamp_skew().as_millis()).unwrap_or(i64::MAX);
                if skew_ms > max_ms {
                    debug!(skew_ms, "Client timestamp outside window");
                    Err(ValidationError::SessionExpired)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Validate the form fields, returning the cleaned values.
    pub fn validate_fields(&self, req: &SubmissionRequest) -> Result<ValidatedFields, ValidationError> {
        let name = self.validate_name(req.name.as_deref())?;
        let email = validate_email(req.email.as_deref())?;
        let phone = self.validate_phone(req.phone.as_deref())?;
        let message = self.validate_message(req.message.as_deref())?;

        Ok(ValidatedFields {
            name,
            email,
            phone,
            message,
        })
    }

    fn validate_name(&self, name: Option<&str>) -> Result<String, ValidationError> {
        let name = name.map(sanitize_text).unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        let len = name.chars().count();
        if len < self.policy.min_name_len {
            return Err(ValidationError::TooShort {
                field: "name",
                min: self.policy.min_name_len,
            });
        }
        if len > self.policy.max_name_len {
            return Err(ValidationError::TooLong {
                field: "name",
                max: self.policy.max_name_len,
            });
        }
        Ok(name)
    }

    fn validate_phone(&self, phone: Option<&str>) -> Result<Option<String>, ValidationError> {
        let phone = match phone.map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ if self.policy.require_phone => {
                return Err(ValidationError::MissingField("phone number"))
            }
            _ => return Ok(None),
        };

        let compact: String = phone
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();
        if PHONE_SHAPE.is_match(&compact) {
            Ok(Some(phone.to_string()))
        } else {
            debug!("Phone number failed shape check");
            Err(ValidationError::InvalidPhone)
        }
    }

    fn validate_message(&self, message: Option<&str>) -> Result<Option<String>, ValidationError> {
        let message = message.map(sanitize_text).unwrap_or_default();
        if message.is_empty() {
            if self.policy.require_message {
                return Err(ValidationError::MissingField("message"));
            }
            return Ok(None);
        }

        let len = message.chars().count();
        if self.policy.require_message && len < self.policy.min_message_len {
            return Err(ValidationError::TooShort {
                field: "message",
                min: self.policy.min_message_len,
            });
        }
        if len > self.policy.max_message_len {
            if !self.policy.truncate_message {
                return Err(ValidationError::TooLong {
                    field: "message",
                    max: self.policy.max_message_len,
                });
            }
            debug!(len, max = self.policy.max_message_len, "Truncating message");
            let cut: String = message.chars().take(self.policy.max_message_len).collect();
            return Ok(Some(cut.trim_end().to_string()));
        }
        Ok(Some(message))
    }
}

fn validate_email(email: Option<&str>) -> Result<String, ValidationError> {
    match email.map(str::trim) {
        Some(e) if e.is_empty() => Err(ValidationError::MissingField("email address")),
        Some(e) if EMAIL_SHAPE.is_match(e) && sanitize_text(e) == e => Ok(e.to_string()),
        Some(_) => Err(ValidationError::InvalidEmail),
        None => Err(ValidationError::MissingField("email address")),
    }
}
