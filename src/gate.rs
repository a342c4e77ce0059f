// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission gate.
//!
//! [`SubmissionGate::evaluate`] runs one submission through the pipeline,
//! stopping at the first step that decides its fate:
//!
//! 1. Rate check per identity (counted before anything else)
//! 2. Honeypot check (bots get a fake success)
//! 3. Client timestamp freshness
//! 4. Field validation on sanitized text
//! 5. Forward to the notifier, then an optional acknowledgement
//!
//! [`SubmissionGate::evaluate_body`] takes the raw JSON object instead and
//! checks the honeypot before the closed schema is applied, so a bot that
//! also sends mistyped or unexpected fields still gets the fake success.
//!
//! Every failure is turned into a [`SubmissionOutcome`] here; nothing
//! escapes to the HTTP layer as an error.

use crate::config::MailConfig;
use crate::error::{GateError, SUCCESS_MESSAGE};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::GateMetrics;
use crate::notifier::{Notification, Notifier, NotifyError};
use crate::submission::{body_trips_honeypot, ContactDetails, SubmissionOutcome, SubmissionRequest};
use crate::template;
use crate::validator::SubmissionValidator;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const LOG_FIELD_MAX: usize = 50;

pub struct SubmissionGate {
    limiter: RateLimiter,
    validator: SubmissionValidator,
    notifier: Arc<dyn Notifier>,
    mail: MailConfig,
    metrics: Option<Arc<GateMetrics>>,
}

impl SubmissionGate {
    pub fn new(
        limiter: RateLimiter,
        validator: SubmissionValidator,
        notifier: Arc<dyn Notifier>,
        mail: MailConfig,
    ) -> Self {
        Self {
            limiter,
            validator,
            notifier,
            mail,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn metrics(&self) -> Option<&Arc<GateMetrics>> {
        self.metrics.as_ref()
    }

    /// Decide the fate of one submission from `identity` at `now`.
    pub async fn evaluate(
        &self,
        request: &SubmissionRequest,
        identity: &str,
        now: DateTime<Utc>,
    ) -> SubmissionOutcome {
        let result = self.process(request, identity, now).await;
        self.finish(result, identity)
    }

    /// Decide the fate of a raw JSON body from `identity` at `now`.
    pub async fn evaluate_body(
        &self,
        body: &Value,
        identity: &str,
        now: DateTime<Utc>,
    ) -> SubmissionOutcome {
        let result = self.process_body(body, identity, now).await;
        self.finish(result, identity)
    }

    /// Outcome for a body that is not JSON at all.
    pub fn reject_malformed(&self, detail: impl Into<String>, identity: &str) -> SubmissionOutcome {
        self.fail(GateError::MalformedRequest(detail.into()), identity)
    }

    fn finish(&self, result: Result<ContactDetails, GateError>, identity: &str) -> SubmissionOutcome {
        match result {
            Ok(details) => {
                info!(
                    name = %truncate(&details.name, LOG_FIELD_MAX),
                    email = %truncate(&details.email, LOG_FIELD_MAX),
                    %identity,
                    submitted_at = %details.submitted_at.to_rfc3339(),
                    "Contact submission forwarded"
                );
                self.record("delivered");
                SubmissionOutcome::delivered(SUCCESS_MESSAGE)
            }
            Err(err) => self.fail(err, identity),
        }
    }

    async fn process(
        &self,
        request: &SubmissionRequest,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<ContactDetails, GateError> {
        self.admit(identity, now).await?;
        if request.is_honeypot_tripped() {
            return Err(GateError::BotDetected);
        }
        self.screen_and_forward(request, identity, now).await
    }

    async fn process_body(
        &self,
        body: &Value,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<ContactDetails, GateError> {
        self.admit(identity, now).await?;
        if body_trips_honeypot(body) {
            return Err(GateError::BotDetected);
        }
        let request = SubmissionRequest::deserialize(body)
            .map_err(|e| GateError::MalformedRequest(e.to_string()))?;
        self.screen_and_forward(&request, identity, now).await
    }

    async fn admit(&self, identity: &str, now: DateTime<Utc>) -> Result<(), GateError> {
        if let RateLimitResult::Limited { retry_after } = self.limiter.check(identity, now).await {
            debug!(%identity, retry_after_secs = retry_after.num_seconds(), "Submission throttled");
            return Err(GateError::RateLimited {
                identity: identity.to_string(),
            });
        }
        Ok(())
    }

    async fn screen_and_forward(
        &self,
        request: &SubmissionRequest,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<ContactDetails, GateError> {
        self.validator
            .check_freshness(request.timestamp_value(), now)?;
        let fields = self.validator.validate_fields(request)?;

        let details = ContactDetails {
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            message: fields.message,
            submitted_at: now,
            identity: identity.to_string(),
        };

        let notification = template::owner_notification(&details, &self.mail.to);
        let started = Instant::now();
        let sent = self.deliver(&notification).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_notifier(started.elapsed().as_secs_f64());
        }
        sent?;

        if self.mail.send_acknowledgement {
            let ack = template::acknowledgement(&details, &self.mail.to);
            if let Err(err) = self.deliver(&ack).await {
                warn!(%identity, kind = %err.kind(), error = %err, "Acknowledgement not sent");
            }
        }

        Ok(details)
    }

    /// Send with a bounded wait. No retry.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let timeout = self.mail.timeout();
        match tokio::time::timeout(timeout, self.notifier.send(notification)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(timeout)),
        }
    }

    fn fail(&self, err: GateError, identity: &str) -> SubmissionOutcome {
        match &err {
            GateError::Transport { kind, source } => {
                error!(%identity, %kind, error = %source, "Notifier failed");
            }
            GateError::BotDetected => info!(%identity, "Honeypot tripped, discarding submission"),
            GateError::RateLimited { .. } => info!(%identity, "Submission rate limited"),
            GateError::Validation(reason) => debug!(%identity, %reason, "Submission rejected"),
            GateError::MalformedRequest(detail) => {
                debug!(%identity, %detail, "Malformed submission body")
            }
        }
        self.record(err.label());
        err.into_outcome()
    }

    fn record(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(outcome);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
