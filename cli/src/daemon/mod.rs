// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Server runtime for `aegis-df serve`
//!
//! The directory runs in the foreground; process supervision is left to the
//! host (systemd, a container runtime).

pub mod server;

pub use server::start_server;
