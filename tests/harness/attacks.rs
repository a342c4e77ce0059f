// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns replayed against the gate on a simulated clock.

use std::collections::HashMap;
use std::fmt;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use contact_gate::SubmissionGate;

use super::generators;

/// Shape of a simulated abuse run.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total submissions to send
    pub total_requests: usize,
    /// Number of distinct caller identities, used round-robin
    pub unique_identities: usize,
    /// Simulated time between consecutive submissions
    pub spacing: Duration,
    /// Fraction of submissions that fill a honeypot field (0.0-1.0)
    pub bot_ratio: f64,
    /// Age of the client timestamp, when replaying a captured form
    pub replay_age: Option<Duration>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_identities: 1,
            spacing: Duration::seconds(1),
            bot_ratio: 0.0,
            replay_age: None,
        }
    }
}

impl AttackConfig {
    /// One caller hammering the form.
    pub fn single_identity_flood() -> Self {
        Self {
            total_requests: 200,
            spacing: Duration::milliseconds(100),
            ..Default::default()
        }
    }

    /// Many callers, a handful of submissions each.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            unique_identities: 100,
            spacing: Duration::milliseconds(20),
            ..Default::default()
        }
    }

    /// A form-filling bot that trips honeypots on most submissions.
    pub fn bot_wave() -> Self {
        Self {
            total_requests: 100,
            unique_identities: 50,
            bot_ratio: 0.8,
            ..Default::default()
        }
    }

    /// A captured form body resubmitted long after it was rendered.
    pub fn stale_replay() -> Self {
        Self {
            total_requests: 40,
            unique_identities: 40,
            replay_age: Some(Duration::hours(2)),
            ..Default::default()
        }
    }

    /// One caller pacing submissions across window boundaries.
    pub fn slow_drip(window: Duration) -> Self {
        Self {
            total_requests: 12,
            spacing: window / 4,
            ..Default::default()
        }
    }
}

/// Tally of gate outcomes for one run.
#[derive(Debug, Default)]
pub struct AttackReport {
    pub total: usize,
    pub forwarded: usize,
    pub discarded: usize,
    pub by_status: HashMap<u16, usize>,
    pub identities: usize,
}

impl AttackReport {
    pub fn count(&self, status: StatusCode) -> usize {
        self.by_status.get(&status.as_u16()).copied().unwrap_or(0)
    }

    /// Fraction of submissions that did not reach the notifier.
    pub fn block_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            1.0 - self.forwarded as f64 / self.total as f64
        }
    }
}

impl fmt::Display for AttackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} forwarded={} discarded={} identities={} block_rate={:.2} statuses={:?}",
            self.total,
            self.forwarded,
            self.discarded,
            self.identities,
            self.block_rate(),
            self.by_status
        )
    }
}

/// Replay `config` against `gate`, starting at `start`.
pub async fn run_attack(
    gate: &SubmissionGate,
    config: &AttackConfig,
    start: DateTime<Utc>,
) -> AttackReport {
    let identities = generators::generate_identities(config.unique_identities);
    let bots = generators::generate_bot_requests();
    let mut report = AttackReport {
        identities: identities.len(),
        ..Default::default()
    };

    for i in 0..config.total_requests {
        let now = start + config.spacing * i as i32;
        let identity = &identities[i % identities.len()];

        let request = if is_selected(config.bot_ratio, i) {
            bots[i % bots.len()].clone()
        } else {
            let stamped_at = config.replay_age.map_or(now, |age| now - age);
            generators::valid_request(stamped_at)
        };

        let outcome = gate.evaluate(&request, identity, now).await;
        report.total += 1;
        if outcome.forwarded {
            report.forwarded += 1;
        } else if outcome.accepted {
            report.discarded += 1;
        }
        *report.by_status.entry(outcome.status.as_u16()).or_insert(0) += 1;
    }

    report
}

/// Deterministic selection of roughly `ratio` of indices.
fn is_selected(ratio: f64, index: usize) -> bool {
    if ratio >= 1.0 {
        true
    } else if ratio <= 0.0 {
        false
    } else {
        (index as f64 * 0.618033988749895) % 1.0 < ratio
    }
}
