// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile document stored in the `users` collection.

use crate::models::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Request limit assumed when a profile is absent or has no limit.
pub const DEFAULT_REQUESTS_LIMIT: i64 = 250;
/// Used-count assumed when a profile is absent or has no used-count.
pub const DEFAULT_REQUESTS_USED: i64 = 51;
/// Request limit written to a freshly created account's profile.
pub const SIGNUP_REQUESTS_LIMIT: i64 = 100;
/// Used-count written to a freshly created account's profile.
pub const SIGNUP_REQUESTS_USED: i64 = 0;

/// Subscription plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl PlanType {
    /// Parse a stored plan name. Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }

    /// Human-readable plan name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
            Self::Enterprise => "Enterprise",
        }
    }
}

/// Per-user plan and usage record.
///
/// Every field is optional on read: documents are written by other processes
/// (billing, usage metering) and older documents may lack fields. Field names
/// follow the collection's existing layout (`displayName`, `createdAt`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        rename = "displayName",
        alias = "display_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    #[serde(
        default,
        rename = "createdAt",
        alias = "created_at",
        with = "firestore::serialize_as_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_plan_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub plan_type: Option<PlanType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub requests_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub requests_used: Option<i64>,
}

impl ProfileDocument {
    /// Profile substituted when the stored document is missing or unreadable.
    pub fn fallback_for(identity: &Identity) -> Self {
        Self {
            uid: None,
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            created_at: None,
            plan_type: Some(PlanType::Free),
            requests_limit: Some(DEFAULT_REQUESTS_LIMIT),
            requests_used: Some(DEFAULT_REQUESTS_USED),
        }
    }

    /// Document written when an account is first created.
    pub fn initial_for(
        identity: &Identity,
        display_name: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: Some(identity.uid.clone()),
            email: identity.email.clone(),
            display_name: display_name.or_else(|| identity.display_name.clone()),
            created_at: Some(created_at),
            plan_type: Some(PlanType::Free),
            requests_limit: Some(SIGNUP_REQUESTS_LIMIT),
            requests_used: Some(SIGNUP_REQUESTS_USED),
        }
    }
}

fn deserialize_plan_type<'de, D>(deserializer: D) -> Result<Option<PlanType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(PlanType::parse))
}
