//! Profile store layer (Firestore).
//!
//! The session core talks to the store through [`ProfileStore`]; the
//! production implementation is [`FirestoreDb`].

pub mod firestore;

pub use self::firestore::FirestoreDb;

use crate::error::AppError;
use crate::models::ProfileDocument;
use crate::subscription::Subscription;
use std::fmt::Display;
use std::future::Future;
use tokio::sync::mpsc;

/// Collection names as constants.
pub mod collections {
    /// Profile documents (keyed by uid)
    pub const USERS: &str = "users";
}

/// Point reads/writes and live subscriptions for profile documents.
///
/// Implementations deliver subscription events through the [`ProfileSink`]
/// handed to [`ProfileStore::subscribe_profile`] until the returned
/// [`Subscription`] is released.
pub trait ProfileStore: Send + Sync + 'static {
    /// Read a profile. `Ok(None)` if the document does not exist.
    fn get_profile(
        &self,
        uid: &str,
    ) -> impl Future<Output = Result<Option<ProfileDocument>, AppError>> + Send;

    /// Create or replace a profile.
    fn set_profile(
        &self,
        uid: &str,
        profile: &ProfileDocument,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Open a live subscription to one profile document.
    ///
    /// The current state (document or absence) is delivered first, followed
    /// by every later change.
    fn subscribe_profile(
        &self,
        uid: &str,
        sink: ProfileSink,
    ) -> impl Future<Output = Result<Subscription, AppError>> + Send;
}

/// One event from a profile subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEvent {
    /// Generation of the subscription that produced the event
    pub generation: u64,
    pub update: ProfileUpdate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileUpdate {
    /// Current document contents, `None` if the document does not exist
    Snapshot(Option<ProfileDocument>),
    /// The subscription reported an error
    Failed(String),
}

impl ProfileEvent {
    pub fn snapshot(generation: u64, profile: Option<ProfileDocument>) -> Self {
        Self {
            generation,
            update: ProfileUpdate::Snapshot(profile),
        }
    }

    pub fn failed(generation: u64, error: impl Display) -> Self {
        Self {
            generation,
            update: ProfileUpdate::Failed(error.to_string()),
        }
    }
}

/// Event sink for one profile subscription (the `onNext`/`onError` pair).
#[derive(Debug, Clone)]
pub struct ProfileSink {
    generation: u64,
    tx: mpsc::UnboundedSender<ProfileEvent>,
}

impl ProfileSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<ProfileEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver a document snapshot. Returns `false` once the receiver is gone.
    pub fn next(&self, profile: Option<ProfileDocument>) -> bool {
        self.tx
            .send(ProfileEvent::snapshot(self.generation, profile))
            .is_ok()
    }

    /// Deliver a subscription error. Returns `false` once the receiver is gone.
    pub fn error(&self, error: impl Display) -> bool {
        self.tx
            .send(ProfileEvent::failed(self.generation, error))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_events_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ProfileSink::new(7, tx);

        assert!(sink.next(None));
        assert!(sink.error("boom"));

        assert_eq!(rx.try_recv().unwrap(), ProfileEvent::snapshot(7, None));
        assert_eq!(rx.try_recv().unwrap(), ProfileEvent::failed(7, "boom"));
    }

    #[test]
    fn test_sink_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = ProfileSink::new(1, tx);
        drop(rx);
        assert!(!sink.next(None));
    }
}
