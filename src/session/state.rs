// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state machine.
//!
//! Pure and synchronous: it consumes identity and profile events and tells
//! the driver what to do with the profile subscription. The driver in
//! [`super::aggregator`] owns the actual subscriptions.

use crate::db::{ProfileEvent, ProfileUpdate};
use crate::models::profile::{DEFAULT_REQUESTS_LIMIT, DEFAULT_REQUESTS_USED};
use crate::models::{Identity, PlanType, ProfileDocument};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No identity event received yet
    #[default]
    Uninitialized,
    SignedOut,
    /// Signed in, waiting for the first profile event
    LoadingProfile,
    Ready,
}

/// Read-only snapshot handed to the view layer.
///
/// While `loading` is true every derived field is indeterminate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionView {
    pub identity: Option<Identity>,
    pub profile: Option<ProfileDocument>,
    pub loading: bool,
    pub is_authenticated: bool,
    pub phase: SessionPhase,
    pub plan_type: PlanType,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub requests_limit: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub requests_used: i64,
    /// `requests_limit - requests_used`, negative when over quota
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub requests_remaining: i64,
}

impl SessionView {
    /// Build a snapshot, computing the derived fields.
    pub fn derive(
        identity: Option<Identity>,
        profile: Option<ProfileDocument>,
        loading: bool,
        phase: SessionPhase,
    ) -> Self {
        let plan_type = profile
            .as_ref()
            .and_then(|p| p.plan_type)
            .unwrap_or_default();
        let requests_limit = profile
            .as_ref()
            .and_then(|p| p.requests_limit)
            .unwrap_or(DEFAULT_REQUESTS_LIMIT);
        let requests_used = profile
            .as_ref()
            .and_then(|p| p.requests_used)
            .unwrap_or(DEFAULT_REQUESTS_USED);

        Self {
            is_authenticated: identity.is_some(),
            identity,
            profile,
            loading,
            phase,
            plan_type,
            requests_limit,
            requests_used,
            requests_remaining: requests_limit - requests_used,
        }
    }
}

impl Default for SessionView {
    fn default() -> Self {
        SessionState::new().view()
    }
}

/// What the driver must do with the profile subscription after an identity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionChange {
    /// Leave the current subscription (if any) alone
    Keep,
    /// Release the current subscription
    Release,
    /// Release the current subscription, then open one for `uid`
    Open { uid: String, generation: u64 },
}

/// Aggregated session state.
#[derive(Debug, Clone)]
pub struct SessionState {
    identity: Option<Identity>,
    profile: Option<ProfileDocument>,
    loading: bool,
    /// Last generation handed out
    generation: u64,
    /// Generation whose events are currently accepted
    active_generation: Option<u64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            identity: None,
            profile: None,
            loading: true,
            generation: 0,
            active_generation: None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn profile(&self) -> Option<&ProfileDocument> {
        self.profile.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Generation of the subscription whose events are accepted, if any.
    pub fn active_generation(&self) -> Option<u64> {
        self.active_generation
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Uninitialized
        } else if self.identity.is_none() {
            SessionPhase::SignedOut
        } else if self.profile.is_none() {
            SessionPhase::LoadingProfile
        } else {
            SessionPhase::Ready
        }
    }

    /// Apply an identity-stream event.
    pub fn on_identity(&mut self, identity: Option<Identity>) -> SubscriptionChange {
        self.loading = false;

        let Some(identity) = identity else {
            self.identity = None;
            self.profile = None;
            return match self.active_generation.take() {
                Some(_) => SubscriptionChange::Release,
                None => SubscriptionChange::Keep,
            };
        };

        let same_principal = self
            .identity
            .as_ref()
            .is_some_and(|current| current.same_principal(&identity));
        let uid = identity.uid.clone();
        self.identity = Some(identity);

        if same_principal && self.active_generation.is_some() {
            return SubscriptionChange::Keep;
        }

        self.profile = None;
        self.generation += 1;
        self.active_generation = Some(self.generation);
        SubscriptionChange::Open {
            uid,
            generation: self.generation,
        }
    }

    /// Apply a profile-stream event. Returns `false` if the event belongs to
    /// a subscription that is no longer active.
    pub fn on_profile(&mut self, event: ProfileEvent) -> bool {
        if self.active_generation != Some(event.generation) {
            return false;
        }
        let Some(identity) = self.identity.as_ref() else {
            return false;
        };

        self.profile = Some(match event.update {
            ProfileUpdate::Snapshot(Some(profile)) => profile,
            ProfileUpdate::Snapshot(None) | ProfileUpdate::Failed(_) => {
                ProfileDocument::fallback_for(identity)
            }
        });
        true
    }

    /// Current snapshot with derived fields.
    pub fn view(&self) -> SessionView {
        SessionView::derive(
            self.identity.clone(),
            self.profile.clone(),
            self.loading,
            self.phase(),
        )
    }
}
