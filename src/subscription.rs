// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Releasable handles for push subscriptions (auth state, profile documents).

use std::fmt;

/// Handle to a live subscription.
///
/// The release action runs exactly once, either through [`Subscription::release`]
/// or when the handle is dropped. It runs inline on the caller's task, so no
/// event from the released source is accepted after `release` returns.
#[must_use = "dropping a Subscription releases it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Release the subscription now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pending_release", &self.release.is_some())
            .finish()
    }
}
