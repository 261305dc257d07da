// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Directory Domain Layer
//!
//! Pure domain types for the community hierarchy. Only the config manifest
//! touches the filesystem.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`path`] | `CommunityPath`, `PathError` |
//! | [`community`] | `AgentJid`, `NodeRecord`, `level_label`, `directory_jid` |
//! | [`hierarchy`] | `HierarchyRegistry`, `LeaveOutcome` |
//! | [`tag_index`] | `TagIndex` |
//! | [`directory`] | `CommunityDirectory` aggregate root |
//! | [`snapshot`] | `GroupsSnapshot`, `RefreshedGroups` |
//! | [`events`] | `DirectoryEvent` |
//! | [`directory_config`] | `DirectoryConfig` manifest |

pub mod path;
pub mod community;
pub mod hierarchy;
pub mod tag_index;
pub mod directory;
pub mod snapshot;
pub mod events;
pub mod directory_config;

pub use path::*;
pub use community::*;
pub use hierarchy::*;
pub use tag_index::*;
pub use directory::*;
pub use snapshot::*;
pub use events::*;
