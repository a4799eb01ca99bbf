// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state aggregation: identity plus live profile.

pub mod aggregator;
pub mod state;

pub use aggregator::{SessionAggregator, SessionHandle};
pub use state::{SessionPhase, SessionState, SessionView, SubscriptionChange};
