// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact gate service.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::METHOD_NOT_ALLOWED_MESSAGE;
use crate::gate::SubmissionGate;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Identity shared by every caller whose address cannot be determined.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Shared application state.
pub struct AppState {
    pub gate: SubmissionGate,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}

impl AppState {
    /// Drop expired rate records and refresh the tracked-identities gauge.
    pub async fn sweep_expired(&self) -> usize {
        let limiter = self.gate.limiter();
        let removed = limiter.cleanup(self.clock.now()).await;
        if let Some(metrics) = self.gate.metrics() {
            metrics.set_tracked_identities(limiter.tracked_identities().await);
        }
        removed
    }
}

/// Response body for the contact endpoint.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route(
            "/contact",
            post(contact)
                .get(method_not_allowed)
                .put(method_not_allowed)
                .delete(method_not_allowed)
                .options(preflight),
        );

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(cors_layer(&state.config.cors.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Correlation key for rate limiting: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then [`UNKNOWN_IDENTITY`].
pub fn extract_identity(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_IDENTITY)
        .to_string()
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /contact`.
///
/// The body is taken as untyped JSON so the gate can look at the hidden
/// fields before the closed schema is applied.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let identity = extract_identity(&headers);
    debug!(%identity, "Processing contact submission");

    let outcome = match payload {
        Ok(Json(body)) => {
            state
                .gate
                .evaluate_body(&body, &identity, state.clock.now())
                .await
        }
        Err(rejection) => state.gate.reject_malformed(rejection.body_text(), &identity),
    };

    (
        outcome.status,
        Json(ContactResponse {
            success: outcome.accepted,
            message: outcome.user_message,
        }),
    )
        .into_response()
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, OPTIONS")],
        Json(ContactResponse {
            success: false,
            message: METHOD_NOT_ALLOWED_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

/// Non-preflight `OPTIONS`; real preflights are answered by the CORS layer.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = state.gate.metrics() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn test_identity_from_forwarded_for() {
        let h = headers(&[("x-forwarded-for", " 203.0.113.5 , 10.0.0.1"), ("x-real-ip", "10.9.9.9")]);
        assert_eq!(extract_identity(&h), "203.0.113.5");
    }

    #[test]
    fn test_identity_from_real_ip() {
        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(extract_identity(&h), "198.51.100.4");

        let h = headers(&[("x-forwarded-for", " "), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(extract_identity(&h), "198.51.100.4");
    }

    #[test]
    fn test_identity_unknown_fallback() {
        assert_eq!(extract_identity(&HeaderMap::new()), UNKNOWN_IDENTITY);
    }
}
