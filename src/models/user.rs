// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity model reported by the credential service.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Authenticated principal.
///
/// Only the identity provider creates or changes these; the rest of the
/// crate treats them as read-only values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    /// Stable user id (Firebase `localId`, also the profile document ID)
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whether `other` refers to the same principal.
    pub fn same_principal(&self, other: &Identity) -> bool {
        self.uid == other.uid
    }
}
