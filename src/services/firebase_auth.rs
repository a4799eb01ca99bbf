// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles:
//! - Account creation and password sign-in
//! - Google sign-in from an ID token (`signInWithIdp`)
//! - Display-name updates and password-reset e-mails
//! - The local session and its auth-state stream

use crate::config::Config;
use crate::models::Identity;
use crate::services::auth_state::{AuthStateHub, AuthStateSource, AuthStateSubscription};
use crate::services::identity::{AuthError, IdentityProvider, SignInOutcome};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// `requestUri` sent with ID-token sign-ins; any valid URL is accepted.
const IDP_REQUEST_URI: &str = "http://localhost";

/// Base URL of the Identity Toolkit API, honoring the Auth emulator.
pub fn identity_toolkit_base_url(emulator_host: Option<&str>) -> String {
    match emulator_host {
        Some(host) => format!("http://{}/identitytoolkit.googleapis.com/v1", host),
        None => IDENTITY_TOOLKIT_URL.to_string(),
    }
}

/// Account payload shared by the sign-up, sign-in and update responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    is_new_user: bool,
}

impl AccountResponse {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.local_id.clone(),
            display_name: self.display_name.clone().filter(|n| !n.is_empty()),
            email: self.email.clone().filter(|e| !e.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Signed-in session.
struct AuthSession {
    identity: Identity,
    id_token: String,
}

/// Firebase Authentication client holding at most one signed-in session.
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: Mutex<Option<AuthSession>>,
    state: AuthStateHub,
}

impl FirebaseAuth {
    /// Create a client with no session. The auth state resolves to signed
    /// out immediately, since no session is persisted between runs.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let auth = Self::with_auth_state(config, AuthStateHub::new())?;
        auth.state.publish(None);
        Ok(auth)
    }

    /// Create a client publishing to an existing hub, leaving its state as is.
    pub fn with_auth_state(config: &Config, state: AuthStateHub) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building identity provider HTTP client")?;

        let base_url = identity_toolkit_base_url(config.auth_emulator_host.as_deref());
        tracing::info!(base_url = %base_url, "Initialized Firebase Auth client");

        Ok(Self {
            http,
            base_url,
            api_key: config.firebase_api_key.clone(),
            session: Mutex::new(None),
            state,
        })
    }

    /// Auth-state hub this client publishes to.
    pub fn auth_state(&self) -> &AuthStateHub {
        &self.state
    }

    fn session(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.base_url,
            method,
            urlencoding::encode(&self.api_key)
        )
    }

    /// POST a JSON body to an `accounts:*` method and parse the response.
    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, AuthError> {
        let response = self
            .http
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        check_response_json(response).await
    }

    /// Store the session from a sign-in style response and publish it.
    fn start_session(&self, response: &AccountResponse) -> Result<Identity, AuthError> {
        let id_token = response
            .id_token
            .clone()
            .ok_or_else(|| AuthError::InvalidResponse("missing idToken".to_string()))?;
        let identity = response.identity();

        *self.session() = Some(AuthSession {
            identity: identity.clone(),
            id_token,
        });
        self.state.publish(Some(identity.clone()));

        tracing::info!(uid = %identity.uid, "Signed in");
        Ok(identity)
    }
}

/// Check response status and parse either the JSON body or the provider error.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            tracing::debug!(status = %status, message = %envelope.error.message, "Identity provider rejected request");
            Err(AuthError::rejected(envelope.error.message))
        }
        Err(_) => Err(AuthError::Network(format!("HTTP {}: {}", status, body))),
    }
}

impl AuthStateSource for FirebaseAuth {
    fn subscribe_auth_state(&self) -> AuthStateSubscription {
        self.state.subscribe()
    }
}

impl IdentityProvider for FirebaseAuth {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post("signUp", &body).await?;
        self.start_session(&response)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post("signInWithPassword", &body).await?;
        self.start_session(&response)
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<SignInOutcome, AuthError> {
        let post_body = format!(
            "id_token={}&providerId=google.com",
            urlencoding::encode(id_token)
        );
        let body = serde_json::json!({
            "postBody": post_body,
            "requestUri": IDP_REQUEST_URI,
            "returnIdpCredential": true,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post("signInWithIdp", &body).await?;
        let identity = self.start_session(&response)?;

        Ok(SignInOutcome {
            identity,
            is_new_user: response.is_new_user,
        })
    }

    async fn update_display_name(&self, display_name: &str) -> Result<Identity, AuthError> {
        let id_token = self
            .session()
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or(AuthError::NotSignedIn)?;

        let body = serde_json::json!({
            "idToken": id_token,
            "displayName": display_name,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post("update", &body).await?;

        let identity = {
            let mut session = self.session();
            let Some(current) = session.as_mut() else {
                return Err(AuthError::NotSignedIn);
            };
            // Another sign-in may have replaced the session meanwhile.
            if current.identity.uid != response.local_id {
                return Err(AuthError::NotSignedIn);
            }
            current.identity.display_name = Some(display_name.to_string());
            if let Some(token) = &response.id_token {
                current.id_token = token.clone();
            }
            current.identity.clone()
        };

        self.state.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let body = serde_json::json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });
        let _: serde_json::Value = self.post("sendOobCode", &body).await?;
        tracing::info!("Password reset e-mail requested");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.session().take();
        self.state.publish(None);

        if let Some(session) = previous {
            tracing::info!(uid = %session.identity.uid, "Signed out");
        }
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        self.session().as_ref().map(|s| s.identity.clone())
    }
}
