// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules.

pub mod user;

pub use user::{require_user, CurrentUser};
