// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;
pub mod theme;

use crate::middleware::require_session;
use crate::AppState;
use axum::http::{header, Method, Uri};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Whether a browser origin may call the API: the configured frontend or
/// a plain-http loopback origin on any port.
fn origin_allowed(origin: &str, frontend_url: &str) -> bool {
    if origin == frontend_url {
        return true;
    }
    let Ok(uri) = origin.parse::<Uri>() else {
        return false;
    };
    uri.scheme_str() == Some("http") && matches!(uri.host(), Some("localhost" | "127.0.0.1"))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                origin_allowed(origin.to_str().unwrap_or(""), &frontend_url)
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(theme::routes());

    // Protected routes (signed-in session required)
    let protected_routes =
        api::routes().route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::require_json_content_type,
        ))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_allowed() {
        let frontend = "https://app.engageperfect.com";
        assert!(origin_allowed(frontend, frontend));
        assert!(origin_allowed("http://localhost:5173", frontend));
        assert!(origin_allowed("http://127.0.0.1:3000", frontend));
        assert!(origin_allowed("http://localhost", frontend));
        assert!(!origin_allowed("https://evil.example", frontend));
        assert!(!origin_allowed("", frontend));

        // Look-alike hosts that merely start with a loopback name
        assert!(!origin_allowed("http://localhost.attacker.example", frontend));
        assert!(!origin_allowed("http://127.0.0.1.nip.io", frontend));
        assert!(!origin_allowed("http://localhost@evil.example", frontend));
        assert!(!origin_allowed("http://localhostevil.example:5173", frontend));
        assert!(!origin_allowed("https://localhost:5173", frontend));
        assert!(!origin_allowed("null", frontend));
    }
}
