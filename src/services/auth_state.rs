// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth-state broadcasting.
//!
//! [`AuthStateHub`] holds the signed-in identity and pushes every change to
//! its listeners. Like the SDK's auth-state listener, a new listener receives
//! the current state right away once it has been resolved.

use crate::models::Identity;
use crate::subscription::Subscription;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Source of auth-state events.
pub trait AuthStateSource: Send + Sync {
    fn subscribe_auth_state(&self) -> AuthStateSubscription;
}

/// An auth-state listener: the event receiver plus its release handle.
#[derive(Debug)]
pub struct AuthStateSubscription {
    pub events: mpsc::UnboundedReceiver<Option<Identity>>,
    pub handle: Subscription,
}

#[derive(Default)]
struct HubInner {
    /// `None` until the first state is published
    current: Option<Option<Identity>>,
    listeners: Vec<(u64, mpsc::UnboundedSender<Option<Identity>>)>,
    next_listener_id: u64,
}

/// Shared auth-state broadcaster.
#[derive(Clone, Default)]
pub struct AuthStateHub {
    inner: Arc<Mutex<HubInner>>,
}

impl AuthStateHub {
    /// A hub whose state is not yet resolved.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener.
    pub fn subscribe(&self) -> AuthStateSubscription {
        let (tx, rx) = mpsc::unbounded_channel();

        let id = {
            let mut inner = self.lock();
            if let Some(current) = &inner.current {
                let _ = tx.send(current.clone());
            }
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.push((id, tx));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        let handle = Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                inner.listeners.retain(|(listener_id, _)| *listener_id != id);
            }
        });

        AuthStateSubscription { events: rx, handle }
    }

    /// Publish a new auth state to every listener.
    pub fn publish(&self, identity: Option<Identity>) {
        let mut inner = self.lock();
        inner.current = Some(identity.clone());
        inner
            .listeners
            .retain(|(_, tx)| tx.send(identity.clone()).is_ok());

        tracing::debug!(
            uid = identity.as_ref().map(|i| i.uid.as_str()),
            listeners = inner.listeners.len(),
            "Auth state published"
        );
    }

    /// Signed-in identity (`None` when signed out or unresolved).
    pub fn current(&self) -> Option<Identity> {
        self.lock().current.clone().flatten()
    }

    /// Whether any state has been published yet.
    pub fn is_resolved(&self) -> bool {
        self.lock().current.is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl AuthStateSource for AuthStateHub {
    fn subscribe_auth_state(&self) -> AuthStateSubscription {
        self.subscribe()
    }
}
