// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the `aegis-df` CLI

pub mod community;
pub mod config;

pub use self::community::CommunityCommand;
pub use self::config::ConfigCommand;
