// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators.

use chrono::{DateTime, Utc};
use contact_gate::submission::ClientTimestamp;
use contact_gate::SubmissionRequest;

/// Generate a pool of caller identities in the 10.x.x.x range.
pub fn generate_identities(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("10.{}.{}.{}", (i >> 16) & 0xFF, (i >> 8) & 0xFF, i & 0xFF))
        .collect()
}

/// A submission that passes every policy variant when stamped with `at`.
pub fn valid_request(at: DateTime<Utc>) -> SubmissionRequest {
    SubmissionRequest {
        name: Some("Anita Desai".to_string()),
        email: Some("anita@example.org".to_string()),
        phone: Some("+91 98220 12345".to_string()),
        message: Some("We would like a security audit of our payment API.".to_string()),
        honeypot: Some(String::new()),
        timestamp: Some(ClientTimestamp::Text(at.timestamp_millis().to_string())),
        ..Default::default()
    }
}

/// Bot submissions: each trips one honeypot field and is otherwise garbage.
pub fn generate_bot_requests() -> Vec<SubmissionRequest> {
    let garbage = || SubmissionRequest {
        name: Some(String::new()),
        email: Some("not-an-email".to_string()),
        message: None,
        timestamp: Some(ClientTimestamp::Text("0".to_string())),
        ..Default::default()
    };
    vec![
        SubmissionRequest {
            honeypot: Some("buy now".to_string()),
            ..garbage()
        },
        SubmissionRequest {
            business_email: Some("bot@spam.example".to_string()),
            ..garbage()
        },
        SubmissionRequest {
            confirm_email: Some("bot@spam.example".to_string()),
            ..garbage()
        },
        SubmissionRequest {
            website: Some("http://spam.example".to_string()),
            ..garbage()
        },
    ]
}

/// Email values that must fail the shape check.
pub fn generate_malformed_emails() -> Vec<&'static str> {
    vec![
        "not-an-email",
        "plainaddress",
        "missing-domain@",
        "@missing-local.org",
        "no-tld@example",
        "spaces in@example.com",
        "two@@example.com",
    ]
}
