// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: sign-up, sign-in, sign-out and password reset.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, AuthAction, Result};
use crate::models::Identity;
use crate::services::{accounts, IdentityProvider};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google))
        .route("/auth/logout", post(logout))
        .route("/auth/reset-password", post(reset_password))
}

fn validate(body: &impl Validate) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "display name must be 1-100 characters"))]
    pub display_name: String,
}

/// Create an account and its initial profile.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<Identity>)> {
    validate(&body)?;

    let identity = accounts::sign_up(
        state.auth.as_ref(),
        &state.db,
        body.email.trim(),
        &body.password,
        body.display_name.trim(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(identity)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Sign in with e-mail and password.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Identity>> {
    validate(&body)?;

    let identity = state
        .auth
        .sign_in_with_password(body.email.trim(), &body.password)
        .await
        .map_err(|e| AppError::auth(AuthAction::SignIn, e))?;

    Ok(Json(identity))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoogleSignInRequest {
    /// Google ID token from the client's Google sign-in
    #[validate(length(min = 1, message = "id_token is required"))]
    pub id_token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GoogleSignInResponse {
    pub identity: Identity,
    pub is_new_user: bool,
}

/// Sign in with a Google ID token, creating the profile if needed.
async fn google(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<Json<GoogleSignInResponse>> {
    validate(&body)?;

    let outcome = accounts::sign_in_with_google(state.auth.as_ref(), &state.db, &body.id_token).await?;

    Ok(Json(GoogleSignInResponse {
        identity: outcome.identity,
        is_new_user: outcome.is_new_user,
    }))
}

/// Sign out of the local session.
async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode> {
    state
        .auth
        .sign_out()
        .await
        .map_err(|e| AppError::auth(AuthAction::SignOut, e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
}

/// Send a password-reset e-mail.
async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode> {
    validate(&body)?;

    state
        .auth
        .send_password_reset(body.email.trim())
        .await
        .map_err(|e| AppError::auth(AuthAction::PasswordReset, e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_validation() {
        let valid = SignUpRequest {
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
            display_name: "Ann".to_string(),
        };
        assert!(validate(&valid).is_ok());

        let missing_name = SignUpRequest {
            display_name: String::new(),
            ..valid
        };
        assert!(matches!(validate(&missing_name), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_login_request_requires_password() {
        let body = LoginRequest {
            email: "a@x.com".to_string(),
            password: String::new(),
        };
        assert!(matches!(validate(&body), Err(AppError::BadRequest(_))));
    }
}
