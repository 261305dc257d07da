// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AEGIS Directory SDK
//!
//! Lets an agent join and leave communities and discover them by tag through
//! the directory's HTTP API.

pub mod client;
pub mod rooms;

pub use client::{DirectoryClient, DirectoryClientError, DEFAULT_REPLY_TIMEOUT};
pub use rooms::room_jids;

pub use aegis_directory::application::request_adapter::{MembershipRequest, SearchReply, SearchRequest};
pub use aegis_directory::domain::{AgentJid, CommunityPath, GroupsSnapshot, RefreshedGroups};
