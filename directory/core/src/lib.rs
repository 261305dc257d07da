// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `aegis-directory`: Community Directory Facilitator
//!
//! Tracks the live hierarchy of agent communities (nested chat rooms) and
//! answers tag-based discovery queries over it.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `CommunityPath`, `HierarchyRegistry`, `TagIndex`, `GroupsSnapshot`, events, config |
//! | [`application`] | Application | request adapter, `DirectoryCoordinator` single-owner writer, `DirectoryService` |
//! | [`infrastructure`] | Infrastructure | `EventBus`, `RoomRoster` chat transport seam |
//! | [`presentation`] | Presentation | Axum HTTP surface (`/groups`, membership, search, SSE) |
//!
//! ## Phase Notes
//!
//! ⚠️ The registry is held in memory only and is owned by a single
//! coordinator task. State is lost on restart.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
