// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed profile operations.
//!
//! Provides:
//! - Point reads and writes of profile documents (`users/{uid}`)
//! - Live profile subscriptions backed by Firestore listen streams

use crate::db::{collections, ProfileSink, ProfileStore};
use crate::error::AppError;
use crate::models::ProfileDocument;
use crate::subscription::Subscription;
use firestore::{FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Listen target used for single-document profile listeners.
const PROFILE_TARGET_ID: u32 = 17;

/// Error type returned from listener callbacks.
type ListenError = Box<dyn std::error::Error + Send + Sync>;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator rejects real credentials; use an unauthenticated connection.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Whether this client is connected (false in offline mode).
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a profile document by uid.
    pub async fn get_profile(&self, uid: &str) -> Result<Option<ProfileDocument>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a profile document.
    pub async fn set_profile(&self, uid: &str, profile: &ProfileDocument) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Live Subscriptions ──────────────────────────────────────

    /// Subscribe to a profile document.
    ///
    /// The current state is read first (a listen stream never reports a
    /// document that does not exist), then a listener forwards every change.
    /// Releasing the returned handle stops delivery immediately; the listener
    /// itself is shut down on a background task.
    pub async fn subscribe_profile(
        &self,
        uid: &str,
        sink: ProfileSink,
    ) -> Result<Subscription, AppError> {
        let client = self.get_client()?.clone();

        let initial = self.get_profile(uid).await?;
        sink.next(initial);

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;

        client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .batch_listen([uid.to_string()])
            .add_target(FirestoreListenerTarget::new(PROFILE_TARGET_ID), &mut listener)
            .map_err(|e| AppError::Database(format!("Failed to add listen target: {}", e)))?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let listener_cancelled = cancelled.clone();

        listener
            .start(move |event| {
                let sink = sink.clone();
                let cancelled = listener_cancelled.clone();
                async move {
                    if !cancelled.load(Ordering::Acquire) {
                        forward_listen_event(event, &sink);
                    }
                    Ok::<(), ListenError>(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let listener_uid = uid.to_string();
        tokio::spawn(async move {
            // Resolves on release or when the handle is dropped.
            let _ = stop_rx.await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(uid = %listener_uid, error = %e, "Profile listener shutdown failed");
            }
        });

        tracing::debug!(uid, "Profile listener started");

        Ok(Subscription::new(move || {
            cancelled.store(true, Ordering::Release);
            let _ = stop_tx.send(());
        }))
    }
}

/// Translate one listen-stream event into a sink event.
fn forward_listen_event(event: FirestoreListenEvent, sink: &ProfileSink) {
    match event {
        FirestoreListenEvent::DocumentChange(ref change) => {
            if let Some(doc) = &change.document {
                match firestore::FirestoreDb::deserialize_doc_to::<ProfileDocument>(doc) {
                    Ok(profile) => {
                        sink.next(Some(profile));
                    }
                    Err(e) => {
                        sink.error(format!("Failed to decode profile document: {}", e));
                    }
                }
            }
        }
        FirestoreListenEvent::DocumentDelete(_) | FirestoreListenEvent::DocumentRemove(_) => {
            sink.next(None);
        }
        _ => {}
    }
}

impl ProfileStore for FirestoreDb {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileDocument>, AppError> {
        FirestoreDb::get_profile(self, uid).await
    }

    async fn set_profile(&self, uid: &str, profile: &ProfileDocument) -> Result<(), AppError> {
        FirestoreDb::set_profile(self, uid, profile).await
    }

    async fn subscribe_profile(
        &self,
        uid: &str,
        sink: ProfileSink,
    ) -> Result<Subscription, AppError> {
        FirestoreDb::subscribe_profile(self, uid, sink).await
    }
}
