// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the signed-in session.

use crate::error::{AppError, Result};
use crate::models::{DashboardView, ProfileDocument};
use crate::services::accounts;
use crate::session::SessionView;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

/// API routes (require a signed-in session).
/// The session guard is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/profile", get(get_profile))
}

/// Current session snapshot.
async fn get_session(Extension(view): Extension<SessionView>) -> Json<SessionView> {
    Json(view)
}

/// Dashboard presentation values.
async fn get_dashboard(Extension(view): Extension<SessionView>) -> Json<DashboardView> {
    Json(DashboardView::from_session(&view))
}

/// Stored profile document of the signed-in user, read directly from the store.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(view): Extension<SessionView>,
) -> Result<Json<ProfileDocument>> {
    let uid = view
        .identity
        .as_ref()
        .map(|identity| identity.uid.as_str())
        .ok_or(AppError::Unauthorized)?;

    let profile = accounts::profile_for(&state.db, uid).await?;
    Ok(Json(profile))
}
