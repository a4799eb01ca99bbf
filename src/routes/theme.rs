// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Theme preference routes.

use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/theme", get(get_theme))
        .route("/api/theme/toggle", post(toggle_theme))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ThemeResponse {
    pub dark_mode: bool,
}

async fn get_theme(State(state): State<Arc<AppState>>) -> Json<ThemeResponse> {
    Json(ThemeResponse {
        dark_mode: state.theme.dark_mode(),
    })
}

async fn toggle_theme(State(state): State<Arc<AppState>>) -> Json<ThemeResponse> {
    let dark_mode = state.theme.toggle();
    tracing::debug!(dark_mode, "Theme toggled");
    Json(ThemeResponse { dark_mode })
}
