// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod dashboard;
pub mod profile;
pub mod user;

pub use dashboard::DashboardView;
pub use profile::{PlanType, ProfileDocument};
pub use user::Identity;
