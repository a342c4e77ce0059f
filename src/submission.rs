// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission payload, the cleaned details handed to the notifier,
//! and the outcome returned to the caller.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hidden form fields, under every key a form may send them as.
pub const HONEYPOT_FIELDS: [&str; 5] = [
    "honeypot",
    "_honeypot",
    "business_email",
    "confirm_email",
    "website",
];

/// Caller-supplied contact form payload.
///
/// The schema is closed: unknown fields fail deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    /// Hidden field; humans leave it empty
    #[serde(default, alias = "_honeypot")]
    pub honeypot: Option<String>,

    #[serde(default)]
    pub business_email: Option<String>,

    #[serde(default)]
    pub confirm_email: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    /// Epoch milliseconds at which the form was rendered
    #[serde(default, alias = "_timestamp")]
    pub timestamp: Option<ClientTimestamp>,
}

/// Client timestamp as sent by browsers: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClientTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

/// Parsed form of a [`ClientTimestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampValue {
    Absent,
    At(DateTime<Utc>),
    Unreadable,
}

impl ClientTimestamp {
    pub fn value(&self) -> TimestampValue {
        let millis = match self {
            ClientTimestamp::Millis(ms) => Some(*ms),
            ClientTimestamp::Fractional(ms) if ms.is_finite() => Some(ms.trunc() as i64),
            ClientTimestamp::Fractional(_) => None,
            ClientTimestamp::Text(s) if s.trim().is_empty() => return TimestampValue::Absent,
            ClientTimestamp::Text(s) => s.trim().parse::<i64>().ok(),
        };
        match millis.and_then(DateTime::<Utc>::from_timestamp_millis) {
            Some(at) => TimestampValue::At(at),
            None => TimestampValue::Unreadable,
        }
    }
}

impl SubmissionRequest {
    /// Whether any hidden field carries a value.
    pub fn is_honeypot_tripped(&self) -> bool {
        [
            &self.honeypot,
            &self.business_email,
            &self.confirm_email,
            &self.website,
        ]
        .iter()
        .any(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }

    pub fn timestamp_value(&self) -> TimestampValue {
        self.timestamp
            .as_ref()
            .map_or(TimestampValue::Absent, ClientTimestamp::value)
    }
}

/// Whether a raw JSON body fills any hidden field, whatever else it holds.
///
/// Any value other than `null`, `""` or an empty container counts.
pub fn body_trips_honeypot(body: &Value) -> bool {
    let Some(fields) = body.as_object() else {
        return false;
    };
    HONEYPOT_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key))
        .any(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::Bool(_) | Value::Number(_) => true,
        })
}

/// Validated, sanitized submission ready to be rendered into notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub identity: String,
}

/// Result of evaluating one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub accepted: bool,
    pub user_message: String,
    pub status: StatusCode,
    /// True only when the notifier was handed the submission and succeeded
    pub forwarded: bool,
}

impl SubmissionOutcome {
    pub fn delivered(user_message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            user_message: user_message.into(),
            status: StatusCode::OK,
            forwarded: true,
        }
    }

    pub fn rejected(status: StatusCode, user_message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            user_message: user_message.into(),
            status,
            forwarded: false,
        }
    }

    /// Success as seen by the caller, with nothing forwarded.
    pub fn discarded(user_message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            user_message: user_message.into(),
            status: StatusCode::OK,
            forwarded: false,
        }
    }
}
