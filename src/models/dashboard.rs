// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presentation values for the dashboard page.

use crate::models::PlanType;
use crate::session::SessionView;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Remaining-quota share below which the quota counts as low.
pub const LOW_QUOTA_THRESHOLD: f64 = 0.2;

const DEFAULT_WELCOME_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardView {
    pub welcome_name: String,
    pub email: Option<String>,
    pub plan_type: PlanType,
    pub plan_label: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub requests_used: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub requests_limit: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub requests_remaining: i64,
    /// Share of the limit used, in percent (0 when the limit is 0)
    pub usage_percent: f64,
    pub low_quota: bool,
    pub show_upgrade: bool,
}

impl DashboardView {
    pub fn from_session(view: &SessionView) -> Self {
        let welcome_name = view
            .profile
            .as_ref()
            .and_then(|p| p.display_name.as_deref())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                view.identity
                    .as_ref()
                    .and_then(|i| i.display_name.as_deref())
                    .filter(|name| !name.is_empty())
            })
            .unwrap_or(DEFAULT_WELCOME_NAME)
            .to_string();

        let email = view
            .profile
            .as_ref()
            .and_then(|p| p.email.clone())
            .or_else(|| view.identity.as_ref().and_then(|i| i.email.clone()));

        let (usage_percent, low_quota) = if view.requests_limit == 0 {
            (0.0, true)
        } else {
            let limit = view.requests_limit as f64;
            (
                view.requests_used as f64 / limit * 100.0,
                (view.requests_remaining as f64 / limit) < LOW_QUOTA_THRESHOLD,
            )
        };

        Self {
            welcome_name,
            email,
            plan_type: view.plan_type,
            plan_label: view.plan_type.label().to_string(),
            requests_used: view.requests_used,
            requests_limit: view.requests_limit,
            requests_remaining: view.requests_remaining,
            usage_percent,
            low_quota,
            show_upgrade: view.plan_type == PlanType::Free,
        }
    }
}
