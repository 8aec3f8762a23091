// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer (local token file).

pub mod token_file;

pub use token_file::TokenStore;
