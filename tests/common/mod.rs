// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use engageperfect::config::Config;
use engageperfect::db::{FirestoreDb, ProfileSink, ProfileStore};
use engageperfect::error::AppError;
use engageperfect::models::{Identity, ProfileDocument};
use engageperfect::routes::create_router;
use engageperfect::services::{
    AuthError, AuthStateHub, AuthStateSource, AuthStateSubscription, FirebaseAuth,
    IdentityProvider, SignInOutcome,
};
use engageperfect::session::{SessionHandle, SessionView};
use engageperfect::subscription::Subscription;
use engageperfect::AppState;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique suffix for test isolation.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Shared, ordered record of subscription opens and releases.
pub type SpyLog = Arc<Mutex<Vec<String>>>;

#[allow(dead_code)]
pub fn entries(log: &SpyLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

// ─── In-memory profile store ─────────────────────────────────

#[derive(Default)]
struct StoreInner {
    docs: HashMap<String, ProfileDocument>,
    /// Live subscriptions by id
    active: HashMap<u64, (String, ProfileSink)>,
    /// Every sink ever handed out, in order
    history: Vec<(String, ProfileSink)>,
    fail_open: bool,
    /// Uids whose opens never complete
    stalled: HashSet<String>,
    next_id: u64,
}

/// In-memory [`ProfileStore`] with a spy log.
///
/// Subscriptions deliver the current document on open and every later
/// `put`/`remove`/`fail` for their uid until released.
#[derive(Clone)]
pub struct MemoryProfileStore {
    inner: Arc<Mutex<StoreInner>>,
    log: SpyLog,
}

#[allow(dead_code)]
impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::with_log(SpyLog::default())
    }

    pub fn with_log(log: SpyLog) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            log,
        }
    }

    pub fn log(&self) -> SpyLog {
        self.log.clone()
    }

    /// Make every later `subscribe_profile` call fail.
    pub fn fail_opens(&self) {
        self.inner.lock().unwrap().fail_open = true;
    }

    /// Make every later `subscribe_profile` call for `uid` hang until cancelled.
    pub fn stall_opens_for(&self, uid: &str) {
        self.inner.lock().unwrap().stalled.insert(uid.to_string());
    }

    fn is_stalled(&self, uid: &str) -> bool {
        self.inner.lock().unwrap().stalled.contains(uid)
    }

    /// Write a document and notify its subscribers.
    pub fn put(&self, uid: &str, doc: ProfileDocument) {
        let mut inner = self.inner.lock().unwrap();
        inner.docs.insert(uid.to_string(), doc.clone());
        for (sub_uid, sink) in inner.active.values() {
            if sub_uid == uid {
                sink.next(Some(doc.clone()));
            }
        }
    }

    /// Delete a document and notify its subscribers.
    pub fn remove(&self, uid: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.docs.remove(uid);
        for (sub_uid, sink) in inner.active.values() {
            if sub_uid == uid {
                sink.next(None);
            }
        }
    }

    /// Report a subscription error to the subscribers of `uid`.
    pub fn fail(&self, uid: &str, error: &str) {
        let inner = self.inner.lock().unwrap();
        for (sub_uid, sink) in inner.active.values() {
            if sub_uid == uid {
                sink.error(error);
            }
        }
    }

    pub fn doc(&self, uid: &str) -> Option<ProfileDocument> {
        self.inner.lock().unwrap().docs.get(uid).cloned()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.lock().unwrap().active.len()
    }

    /// Sinks ever handed out for `uid`, oldest first (released ones included).
    pub fn sinks_for(&self, uid: &str) -> Vec<ProfileSink> {
        self.inner
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|(sub_uid, _)| sub_uid == uid)
            .map(|(_, sink)| sink.clone())
            .collect()
    }

    fn open(&self, uid: &str, sink: ProfileSink) -> Result<Subscription, AppError> {
        self.log.lock().unwrap().push(format!("open:{}", uid));

        let id = {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_open {
                return Err(AppError::Database("listener refused".to_string()));
            }
            sink.next(inner.docs.get(uid).cloned());
            let id = inner.next_id;
            inner.next_id += 1;
            inner.active.insert(id, (uid.to_string(), sink.clone()));
            inner.history.push((uid.to_string(), sink));
            id
        };

        let inner = Arc::downgrade(&self.inner);
        let log = self.log.clone();
        let uid = uid.to_string();
        Ok(Subscription::new(move || {
            log.lock().unwrap().push(format!("release:{}", uid));
            if let Some(inner) = inner.upgrade() {
                inner.lock().unwrap().active.remove(&id);
            }
        }))
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileDocument>, AppError> {
        Ok(self.doc(uid))
    }

    async fn set_profile(&self, uid: &str, profile: &ProfileDocument) -> Result<(), AppError> {
        self.put(uid, profile.clone());
        Ok(())
    }

    async fn subscribe_profile(
        &self,
        uid: &str,
        sink: ProfileSink,
    ) -> Result<Subscription, AppError> {
        if self.is_stalled(uid) {
            self.log.lock().unwrap().push(format!("open:{}", uid));
            let _cancelled = CancelGuard {
                log: self.log.clone(),
                uid: uid.to_string(),
            };
            std::future::pending::<()>().await;
        }
        self.open(uid, sink)
    }
}

/// Logs `cancel:{uid}` when a stalled open is dropped.
struct CancelGuard {
    log: SpyLog,
    uid: String,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.log.lock().unwrap().push(format!("cancel:{}", self.uid));
    }
}

/// Wait (up to 2s) until `entry` has been logged.
#[allow(dead_code)]
pub async fn wait_for_entry(log: &SpyLog, entry: &str) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !log.lock().unwrap().iter().any(|e| e == entry) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {:?}", entry));
}

// ─── Auth-state source that records its release ──────────────

/// Wraps an [`AuthStateHub`], logging `release:auth` when its listener is released.
#[allow(dead_code)]
pub struct SpyAuthSource {
    pub hub: AuthStateHub,
    pub log: SpyLog,
}

impl AuthStateSource for SpyAuthSource {
    fn subscribe_auth_state(&self) -> AuthStateSubscription {
        let AuthStateSubscription { events, handle } = self.hub.subscribe();
        let log = self.log.clone();
        AuthStateSubscription {
            events,
            handle: Subscription::new(move || {
                log.lock().unwrap().push("release:auth".to_string());
                handle.release();
            }),
        }
    }
}

// ─── Fake identity provider ──────────────────────────────────

#[derive(Default)]
struct FakeAccounts {
    by_email: HashMap<String, (String, Identity)>,
    google: HashMap<String, Identity>,
    current: Option<Identity>,
    next_uid: u64,
}

/// Identity provider with in-memory accounts and Firebase-style error codes.
#[derive(Default)]
pub struct FakeIdentityProvider {
    accounts: Mutex<FakeAccounts>,
    pub hub: AuthStateHub,
}

#[allow(dead_code)]
impl FakeIdentityProvider {
    pub fn new() -> Self {
        let provider = Self::default();
        provider.hub.publish(None);
        provider
    }

    fn sign_in_as(&self, identity: Identity) -> Identity {
        self.accounts.lock().unwrap().current = Some(identity.clone());
        self.hub.publish(Some(identity.clone()));
        identity
    }
}

impl AuthStateSource for FakeIdentityProvider {
    fn subscribe_auth_state(&self) -> AuthStateSubscription {
        self.hub.subscribe()
    }
}

impl IdentityProvider for FakeIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.by_email.contains_key(email) {
                return Err(AuthError::rejected("EMAIL_EXISTS"));
            }
            if !email.contains('@') {
                return Err(AuthError::rejected("INVALID_EMAIL"));
            }
            if password.len() < 6 {
                return Err(AuthError::rejected(
                    "WEAK_PASSWORD : Password should be at least 6 characters",
                ));
            }
            accounts.next_uid += 1;
            let identity =
                Identity::new(format!("uid-{}", accounts.next_uid)).with_email(email);
            accounts
                .by_email
                .insert(email.to_string(), (password.to_string(), identity.clone()));
            identity
        };
        Ok(self.sign_in_as(identity))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let identity = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.by_email.get(email) {
                Some((stored, identity)) if stored == password => identity.clone(),
                _ => return Err(AuthError::rejected("INVALID_LOGIN_CREDENTIALS")),
            }
        };
        Ok(self.sign_in_as(identity))
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<SignInOutcome, AuthError> {
        if id_token == "bad-token" {
            return Err(AuthError::rejected("INVALID_IDP_RESPONSE : bad token"));
        }
        let (identity, is_new_user) = {
            let mut accounts = self.accounts.lock().unwrap();
            match accounts.google.get(id_token) {
                Some(identity) => (identity.clone(), false),
                None => {
                    let identity = Identity::new(format!("google-{}", id_token))
                        .with_display_name("Google User")
                        .with_email(format!("{}@gmail.com", id_token));
                    accounts.google.insert(id_token.to_string(), identity.clone());
                    (identity, true)
                }
            }
        };
        let identity = self.sign_in_as(identity);
        Ok(SignInOutcome {
            identity,
            is_new_user,
        })
    }

    async fn update_display_name(&self, display_name: &str) -> Result<Identity, AuthError> {
        let identity = {
            let mut accounts = self.accounts.lock().unwrap();
            let current = accounts.current.as_mut().ok_or(AuthError::NotSignedIn)?;
            current.display_name = Some(display_name.to_string());
            current.clone()
        };
        self.hub.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        if self.accounts.lock().unwrap().by_email.contains_key(email) {
            Ok(())
        } else {
            Err(AuthError::rejected("EMAIL_NOT_FOUND"))
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.accounts.lock().unwrap().current = None;
        self.hub.publish(None);
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        self.accounts.lock().unwrap().current.clone()
    }
}

// ─── Session helpers ─────────────────────────────────────────

/// Wait (up to 2s) for a snapshot matching `predicate`.
#[allow(dead_code)]
pub async fn wait_for_view<F>(session: &SessionHandle, predicate: F) -> SessionView
where
    F: Fn(&SessionView) -> bool,
{
    let mut rx = session.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        rx.wait_for(|view| predicate(view))
            .await
            .map(|view| view.clone())
            .expect("session aggregator stopped")
    })
    .await
    .expect("timed out waiting for session snapshot")
}

#[allow(dead_code)]
pub fn uid_of(view: &SessionView) -> Option<&str> {
    view.identity.as_ref().map(|i| i.uid.as_str())
}

// ─── HTTP app helpers ────────────────────────────────────────

#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        theme_file: std::env::temp_dir().join(unique_id("engageperfect-theme")),
        ..Config::default()
    }
}

/// Create a test app with offline dependencies and an auth state that is
/// still unresolved. Publish on the returned hub to drive the session.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, AuthStateHub) {
    let config = test_config();
    let hub = AuthStateHub::new();
    let auth = Arc::new(
        FirebaseAuth::with_auth_state(&config, hub.clone()).expect("Failed to build auth client"),
    );
    let db = FirestoreDb::new_mock();

    let state = Arc::new(AppState::new(config, auth, db));
    (create_router(state.clone()), state, hub)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
