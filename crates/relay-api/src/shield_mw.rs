use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::warn;

use relay_shield::{Action, RequestFingerprint};

use crate::server::AppState;

/// Scores every inbound request through the DDoS shield (C8) before it
/// reaches a handler. `/health` and `/metrics` are exempt — scraping them
/// must never itself trip rate limiting.
pub async fn shield_layer(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if path == "/health" || path == "/metrics" {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let user_agent = request
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body_size = request
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let now = Utc::now().timestamp();
    let fp = RequestFingerprint {
        ip: addr.ip().to_string(),
        path,
        method,
        user_agent,
        body_size,
        timestamp: now,
    };

    let decision = state.shield.evaluate(&fp, now);
    state.metrics.shield_requests_total.fetch_add(1, Ordering::Relaxed);
    state
        .metrics
        .set_defense_level(state.shield.current_defense_level());

    match decision.action {
        Action::Allow => {
            state.metrics.shield_allowed_total.fetch_add(1, Ordering::Relaxed);
            next.run(request).await
        }
        Action::RateLimit => {
            state
                .metrics
                .shield_rate_limited_total
                .fetch_add(1, Ordering::Relaxed);
            StatusCode::TOO_MANY_REQUESTS.into_response()
        }
        Action::Delay { secs } => {
            state.metrics.shield_delayed_total.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(Duration::from_secs(secs)).await;
            next.run(request).await
        }
        Action::Block { .. } => {
            state.metrics.shield_blocked_total.fetch_add(1, Ordering::Relaxed);
            warn!(ip = %fp.ip, "request blocked by ddos shield");
            StatusCode::FORBIDDEN.into_response()
        }
        Action::EmergencyBlock { .. } => {
            state
                .metrics
                .shield_emergency_blocked_total
                .fetch_add(1, Ordering::Relaxed);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
