// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account workflows spanning the identity provider and the profile store.

use crate::db::ProfileStore;
use crate::error::{AppError, AuthAction};
use crate::models::{Identity, ProfileDocument};
use crate::services::identity::{IdentityProvider, SignInOutcome};

/// Create an account, set its display name and write its initial profile.
pub async fn sign_up<P, S>(
    provider: &P,
    store: &S,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<Identity, AppError>
where
    P: IdentityProvider,
    S: ProfileStore,
{
    let created = provider
        .create_account(email, password)
        .await
        .map_err(|e| AppError::auth(AuthAction::SignUp, e))?;

    let identity = provider
        .update_display_name(display_name)
        .await
        .map_err(|e| AppError::auth(AuthAction::SignUp, e))?;

    let profile = ProfileDocument::initial_for(
        &identity,
        Some(display_name.to_string()),
        chrono::Utc::now(),
    );
    store.set_profile(&created.uid, &profile).await?;

    tracing::info!(uid = %created.uid, "Account created");
    Ok(identity)
}

/// Sign in with Google, creating the profile document on first sign-in.
///
/// The profile is written whenever none exists, not only when the provider
/// reports a new account, so accounts created elsewhere get one too.
pub async fn sign_in_with_google<P, S>(
    provider: &P,
    store: &S,
    id_token: &str,
) -> Result<SignInOutcome, AppError>
where
    P: IdentityProvider,
    S: ProfileStore,
{
    let outcome = provider
        .sign_in_with_google(id_token)
        .await
        .map_err(|e| AppError::auth(AuthAction::GoogleSignIn, e))?;

    let uid = &outcome.identity.uid;
    if store.get_profile(uid).await?.is_none() {
        let profile = ProfileDocument::initial_for(&outcome.identity, None, chrono::Utc::now());
        store.set_profile(uid, &profile).await?;
        tracing::info!(uid = %uid, "Created profile for Google account");
    }

    Ok(outcome)
}

/// Read a user's stored profile.
pub async fn profile_for<S>(store: &S, uid: &str) -> Result<ProfileDocument, AppError>
where
    S: ProfileStore,
{
    store
        .get_profile(uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", uid)))
}
