// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod auth_state;
pub mod firebase_auth;
pub mod identity;
pub mod theme;

pub use auth_state::{AuthStateHub, AuthStateSource, AuthStateSubscription};
pub use firebase_auth::FirebaseAuth;
pub use identity::{AuthError, AuthErrorCode, IdentityProvider, SignInOutcome};
pub use theme::{ThemeError, ThemeService};
