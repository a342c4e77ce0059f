// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for contact gate tests: notifier doubles, request
//! generators and a gate builder.

#![allow(dead_code)]

pub mod attacks;
pub mod generators;
pub mod notifiers;

use chrono::{DateTime, TimeZone, Utc};
use contact_gate::{
    config::{MailConfig, RateLimitConfig, SubmissionPolicy},
    Notifier, RateLimiter, SubmissionGate, SubmissionValidator,
};
use std::sync::Arc;

pub const OWNER: &str = "owner@example.com";

/// Fixed start time for deterministic tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 15, 11, 0, 0).unwrap()
}

pub fn mail_config() -> MailConfig {
    MailConfig {
        to: OWNER.to_string(),
        send_acknowledgement: true,
        timeout_secs: 1,
        ..Default::default()
    }
}

pub fn rate_config(max_requests: u32, window_secs: u64) -> RateLimitConfig {
    RateLimitConfig {
        max_requests,
        window_secs,
        ..Default::default()
    }
}

pub fn build_gate(
    rate: RateLimitConfig,
    policy: SubmissionPolicy,
    notifier: Arc<dyn Notifier>,
) -> SubmissionGate {
    SubmissionGate::new(
        RateLimiter::new(rate),
        SubmissionValidator::new(policy),
        notifier,
        mail_config(),
    )
}

/// Every combination of the policy switches that deployments disagree on.
pub fn policy_matrix() -> Vec<SubmissionPolicy> {
    let mut policies = Vec::new();
    for require_phone in [false, true] {
        for require_message in [false, true] {
            for timestamp_required in [false, true] {
                policies.push(SubmissionPolicy {
                    require_phone,
                    require_message,
                    timestamp_required,
                    ..Default::default()
                });
            }
        }
    }
    policies
}
