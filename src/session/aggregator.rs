// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session aggregator task.
//!
//! Owns the [`SessionState`], the auth-state listener and at most one profile
//! subscription. All mutation happens on a single tokio task; snapshots are
//! published on a `watch` channel.
//!
//! Opening a profile subscription may take network round trips, so the open
//! runs as a future polled alongside the identity and shutdown signals.
//! Dropping that future cancels the open.

use crate::db::{ProfileEvent, ProfileSink, ProfileStore, ProfileUpdate};
use crate::error::AppError;
use crate::models::Identity;
use crate::services::auth_state::{AuthStateSource, AuthStateSubscription};
use crate::session::state::{SessionState, SessionView, SubscriptionChange};
use crate::subscription::Subscription;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

type OpenFuture = Pin<Box<dyn Future<Output = Result<Subscription, AppError>> + Send>>;

/// A profile subscription that is still being opened.
struct PendingOpen {
    uid: String,
    generation: u64,
    future: OpenFuture,
}

/// Spawns the aggregator task.
pub struct SessionAggregator;

impl SessionAggregator {
    /// Subscribe to `auth` and start aggregating.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<A, S>(auth: &A, store: S) -> SessionHandle
    where
        A: AuthStateSource + ?Sized,
        S: ProfileStore,
    {
        let auth_subscription = auth.subscribe_auth_state();
        let state = SessionState::new();
        let (view_tx, view_rx) = watch::channel(state.view());
        let (profile_tx, profile_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let driver = Driver {
            state,
            store: Arc::new(store),
            profile_subscription: None,
            pending_open: None,
            profile_tx,
            view_tx,
        };
        let task = tokio::spawn(driver.run(auth_subscription, profile_rx, shutdown_rx));

        SessionHandle {
            view: view_rx,
            shutdown: Mutex::new(Some(shutdown_tx)),
            task: Mutex::new(Some(task)),
        }
    }
}

struct Driver<S> {
    state: SessionState,
    store: Arc<S>,
    profile_subscription: Option<Subscription>,
    pending_open: Option<PendingOpen>,
    profile_tx: mpsc::UnboundedSender<ProfileEvent>,
    view_tx: watch::Sender<SessionView>,
}

/// Resolve when the pending open (if any) finishes; never resolves otherwise.
async fn opened(pending: &mut Option<PendingOpen>) -> Result<Subscription, AppError> {
    match pending {
        Some(open) => open.future.as_mut().await,
        None => std::future::pending().await,
    }
}

impl<S: ProfileStore> Driver<S> {
    async fn run(
        mut self,
        auth: AuthStateSubscription,
        mut profile_rx: mpsc::UnboundedReceiver<ProfileEvent>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let AuthStateSubscription {
            events: mut identity_rx,
            handle: auth_handle,
        } = auth;

        tracing::debug!("Session aggregator started");

        loop {
            tokio::select! {
                biased;
                // Also resolves when the handle is dropped.
                _ = &mut shutdown_rx => break,
                identity = identity_rx.recv() => match identity {
                    Some(identity) => self.handle_identity(identity),
                    None => {
                        tracing::info!("Auth state stream closed");
                        break;
                    }
                },
                result = opened(&mut self.pending_open) => self.finish_open(result),
                Some(event) = profile_rx.recv() => self.handle_profile(event),
            }
        }

        // Identity listener first, then the profile listener.
        auth_handle.release();
        self.release_profile();
        tracing::info!("Session aggregator stopped");
    }

    fn handle_identity(&mut self, identity: Option<Identity>) {
        match self.state.on_identity(identity) {
            SubscriptionChange::Keep => {}
            SubscriptionChange::Release => {
                self.release_profile();
                tracing::info!("Signed out, profile subscription released");
            }
            SubscriptionChange::Open { uid, generation } => {
                self.release_profile();
                self.start_open(uid, generation);
            }
        }
        self.publish();
    }

    fn handle_profile(&mut self, event: ProfileEvent) {
        let generation = event.generation;
        if let ProfileUpdate::Failed(error) = &event.update {
            if self.state.active_generation() == Some(generation) {
                tracing::warn!(
                    uid = self.state.identity().map(|i| i.uid.as_str()),
                    error = %error,
                    "Profile subscription error, using fallback profile"
                );
            }
        }

        if self.state.on_profile(event) {
            self.publish();
        } else {
            tracing::debug!(generation, "Ignoring stale profile event");
        }
    }

    fn start_open(&mut self, uid: String, generation: u64) {
        let store = self.store.clone();
        let sink = ProfileSink::new(generation, self.profile_tx.clone());
        let open_uid = uid.clone();
        let future: OpenFuture =
            Box::pin(async move { store.subscribe_profile(&open_uid, sink).await });

        self.pending_open = Some(PendingOpen {
            uid,
            generation,
            future,
        });
    }

    fn finish_open(&mut self, result: Result<Subscription, AppError>) {
        let Some(PendingOpen {
            uid, generation, ..
        }) = self.pending_open.take()
        else {
            return;
        };

        match result {
            Ok(subscription) if self.state.active_generation() == Some(generation) => {
                tracing::debug!(uid = %uid, generation, "Profile subscription opened");
                self.profile_subscription = Some(subscription);
            }
            Ok(subscription) => {
                tracing::debug!(
                    uid = %uid,
                    generation,
                    "Releasing profile subscription opened too late"
                );
                subscription.release();
            }
            Err(e) => {
                tracing::warn!(
                    uid = %uid,
                    error = %e,
                    "Failed to open profile subscription, using fallback profile"
                );
                if self.state.on_profile(ProfileEvent::failed(generation, e)) {
                    self.publish();
                }
            }
        }
    }

    /// Cancel a pending open and release the active subscription, inline.
    fn release_profile(&mut self) {
        if let Some(pending) = self.pending_open.take() {
            tracing::debug!(uid = %pending.uid, "Cancelling pending profile subscription");
        }
        if let Some(subscription) = self.profile_subscription.take() {
            subscription.release();
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.state.view());
    }
}

/// Handle to a running aggregator.
///
/// Dropping the handle stops the aggregator as well.
#[derive(Debug)]
pub struct SessionHandle {
    view: watch::Receiver<SessionView>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionHandle {
    /// Current snapshot.
    pub fn snapshot(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Wait until the first identity event has been applied.
    pub async fn resolved(&self) -> SessionView {
        let mut rx = self.view.clone();
        let resolved = rx.wait_for(|view| !view.loading).await.map(|view| view.clone());
        match resolved {
            Ok(view) => view,
            // Aggregator gone; the last snapshot is all there is.
            Err(_) => self.snapshot(),
        }
    }

    /// Stop the aggregator, releasing its subscriptions, and wait for it.
    pub async fn shutdown(&self) {
        let shutdown = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }

        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Session aggregator task failed");
            }
        }
    }
}
