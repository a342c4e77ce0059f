// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gate Service
//!
//! Receives contact form submissions on `POST /contact`, filters abuse and
//! forwards accepted submissions to the site owner by email.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is read
//! first when present). The main keys:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: 5 per 900s by default
//! - `REQUIRE_PHONE`, `REQUIRE_MESSAGE`, `TIMESTAMP_REQUIRED`: policy switches
//! - `MAIL_RELAY_URL`, `MAIL_RELAY_API_KEY`, `MAIL_TO`: delivery; without a
//!   relay URL submissions are only logged

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_gate::{
    build_notifier,
    clock::SystemClock,
    config::Config,
    gate::SubmissionGate,
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::GateMetrics,
    validator::SubmissionValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        require_phone = config.policy.require_phone,
        require_message = config.policy.require_message,
        timestamp_required = config.policy.timestamp_required,
        relay_configured = config.mail.relay_url.is_some(),
        "Starting contact gate"
    );
    if config.mail.relay_url.is_none() {
        warn!("MAIL_RELAY_URL not set, submissions will only be logged");
    }

    let metrics = Arc::new(GateMetrics::new()?);
    let gate = SubmissionGate::new(
        RateLimiter::new(config.rate_limit.clone()),
        SubmissionValidator::new(config.policy.clone()),
        build_notifier(&config.mail),
        config.mail.clone(),
    )
    .with_metrics(metrics);

    let state = Arc::new(AppState {
        gate,
        clock: Arc::new(SystemClock),
        config: config.clone(),
    });

    // Spawn sweep task
    let sweep_state = state.clone();
    let sweep_interval = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            sweep_state.sweep_expired().await;
        }
    });

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
