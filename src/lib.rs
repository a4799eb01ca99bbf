// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EngagePerfect session client.
//!
//! Aggregates the Firebase auth state and the signed-in user's live
//! Firestore profile into one session snapshot, and serves it (with the
//! account flows and dashboard values) over a loopback HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod subscription;

use config::Config;
use db::FirestoreDb;
use services::{FirebaseAuth, ThemeService};
use session::{SessionAggregator, SessionHandle};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: Arc<FirebaseAuth>,
    pub db: FirestoreDb,
    pub session: SessionHandle,
    pub theme: ThemeService,
}

impl AppState {
    /// Start the session aggregator and load the theme preference.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config, auth: Arc<FirebaseAuth>, db: FirestoreDb) -> Self {
        let session = SessionAggregator::spawn(auth.as_ref(), db.clone());
        let theme = ThemeService::load(&config.theme_file, config.prefers_dark);

        Self {
            config,
            auth,
            db,
            session,
            theme,
        }
    }
}
