// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`api`] | Axum router for the dashboard, membership, search, and event stream |

pub mod api;
