// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential service capability set and its error types.

use crate::models::Identity;
use crate::services::auth_state::AuthStateSource;
use std::future::Future;

/// Result of a federated sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    pub identity: Identity,
    /// The provider created the account during this sign-in
    pub is_new_user: bool,
}

/// Operations offered by the identity provider.
///
/// Successful sign-in, sign-up, display-name updates and sign-out are all
/// reflected on the provider's auth-state stream.
pub trait IdentityProvider: AuthStateSource {
    fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;

    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;

    /// Sign in with a Google ID token obtained by the caller.
    fn sign_in_with_google(
        &self,
        id_token: &str,
    ) -> impl Future<Output = Result<SignInOutcome, AuthError>> + Send;

    /// Set the display name of the signed-in user.
    fn update_display_name(
        &self,
        display_name: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;

    fn send_password_reset(&self, email: &str)
        -> impl Future<Output = Result<(), AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn current_identity(&self) -> Option<Identity>;
}

/// Provider rejection reasons, parsed from the REST error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailExists,
    EmailNotFound,
    InvalidPassword,
    InvalidLoginCredentials,
    InvalidEmail,
    WeakPassword,
    UserDisabled,
    TooManyAttempts,
    InvalidIdpResponse,
    Other,
}

impl AuthErrorCode {
    /// Parse an error message such as `"WEAK_PASSWORD : Password should be at least 6 characters"`.
    pub fn from_message(message: &str) -> Self {
        let code = message
            .split(|c: char| c == ':' || c.is_whitespace())
            .next()
            .unwrap_or("");

        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "EMAIL_NOT_FOUND" => Self::EmailNotFound,
            "INVALID_PASSWORD" => Self::InvalidPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidLoginCredentials,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "INVALID_IDP_RESPONSE" => Self::InvalidIdpResponse,
            _ => Self::Other,
        }
    }

    /// The credentials themselves were wrong (as opposed to a service problem).
    pub fn is_invalid_credential(self) -> bool {
        matches!(
            self,
            Self::EmailNotFound | Self::InvalidPassword | Self::InvalidLoginCredentials
        )
    }
}

/// Credential service errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Identity provider rejected request: {message}")]
    Rejected {
        code: AuthErrorCode,
        message: String,
    },

    #[error("Identity provider request failed: {0}")]
    Network(String),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    pub fn rejected(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Rejected {
            code: AuthErrorCode::from_message(&message),
            message,
        }
    }

    /// Rejection code, if the provider rejected the request.
    pub fn code(&self) -> Option<AuthErrorCode> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}
