// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session guard for protected routes.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Middleware that requires a resolved, signed-in session.
///
/// Only `loading` and `is_authenticated` are consulted. The snapshot is
/// passed on to the handler as an `Extension<SessionView>`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let view = state.session.snapshot();

    if view.loading {
        return Err(AppError::SessionLoading);
    }
    if !view.is_authenticated {
        tracing::debug!(path = %request.uri().path(), "Unauthenticated request to protected route");
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(view);
    Ok(next.run(request).await)
}
