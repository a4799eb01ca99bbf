// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (session guard, security headers, JSON content type).

pub mod security;
pub mod session_guard;

pub use session_guard::require_session;
