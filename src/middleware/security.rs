// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers and request content-type middleware.
//!
//! Session and profile responses are per-user, so nothing is cached.

use crate::error::AppError;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Add security headers to all responses.
pub async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("camera=(), geolocation=(), microphone=(), payment=()"),
    );

    response
}

fn is_json(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Reject POSTs that are not `application/json`.
///
/// Any other content type makes a cross-origin POST a CORS simple request,
/// which skips the preflight and the origin check.
pub async fn require_json_content_type(req: Request, next: Next) -> Response {
    if req.method() == Method::POST && !is_json(req.headers().get(header::CONTENT_TYPE)) {
        tracing::debug!(path = %req.uri().path(), "Rejecting non-JSON POST");
        return AppError::UnsupportedMediaType.into_response();
    }
    next.run(req).await
}
