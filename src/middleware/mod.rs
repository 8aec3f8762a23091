// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware for the local callback listener.

pub mod security;

pub use security::add_security_headers;
