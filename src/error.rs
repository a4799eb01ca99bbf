// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::identity::{AuthError, AuthErrorCode};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The user-facing operation an identity-provider error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    SignIn,
    GoogleSignIn,
    SignUp,
    PasswordReset,
    SignOut,
}

impl AuthAction {
    /// Message shown to the user when `error` ends this action.
    pub fn user_message(self, error: &AuthError) -> &'static str {
        let code = error.code();
        match self {
            AuthAction::SignIn => match code {
                Some(c) if c.is_invalid_credential() => "Invalid email or password.",
                _ => "Failed to sign in. Please try again.",
            },
            AuthAction::GoogleSignIn => "Failed to sign in with Google. Please try again.",
            AuthAction::SignUp => match code {
                Some(AuthErrorCode::EmailExists) => "An account with this email already exists.",
                Some(AuthErrorCode::WeakPassword) => "Password should be at least 6 characters.",
                Some(AuthErrorCode::InvalidEmail) => "Please enter a valid email address.",
                _ => "Failed to create an account. Please try again.",
            },
            AuthAction::PasswordReset => match code {
                Some(AuthErrorCode::EmailNotFound) => "No account found with this email address.",
                _ => "Failed to send reset email. Please try again.",
            },
            AuthAction::SignOut => "Failed to sign out. Please try again.",
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Session is still loading")]
    SessionLoading,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Expected an application/json request body")]
    UnsupportedMediaType,

    #[error("{message}")]
    Auth {
        message: &'static str,
        #[source]
        source: AuthError,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap an identity-provider error with the message for `action`.
    pub fn auth(action: AuthAction, source: AuthError) -> Self {
        AppError::Auth {
            message: action.user_message(&source),
            source,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn auth_status(source: &AuthError) -> StatusCode {
    match source {
        AuthError::Rejected { code, .. } => match code {
            c if c.is_invalid_credential() => StatusCode::UNAUTHORIZED,
            AuthErrorCode::EmailExists => StatusCode::CONFLICT,
            AuthErrorCode::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthErrorCode::UserDisabled => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        },
        AuthError::NotSignedIn => StatusCode::UNAUTHORIZED,
        AuthError::Network(_) | AuthError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::SessionLoading => {
                (StatusCode::SERVICE_UNAVAILABLE, "session_loading", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                None,
            ),
            AppError::Auth { message, source } => {
                tracing::warn!(error = %source, "Identity provider error");
                (auth_status(source), "auth_error", Some(message.to_string()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        let mut response = (status, Json(body)).into_response();
        match self {
            AppError::Unauthorized => {
                response
                    .headers_mut()
                    .insert(header::LOCATION, HeaderValue::from_static("/login"));
            }
            AppError::SessionLoading => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            }
            _ => {}
        }
        response
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
