// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the community directory
//! Published to the EventBus after each applied request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::community::AgentJid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryEvent {
    /// A sender was appended to the leaf of `path`
    MemberJoined {
        path: String,
        domain: String,
        sender: AgentJid,
        tags: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A sender left `path`; `pruned` lists removed nodes leaf-first
    MemberLeft {
        path: String,
        domain: String,
        sender: AgentJid,
        pruned: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A discovery query was answered
    CommunitiesSearched {
        tags: Vec<String>,
        matches: usize,
        timestamp: DateTime<Utc>,
    },
}

impl DirectoryEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DirectoryEvent::MemberJoined { timestamp, .. } => *timestamp,
            DirectoryEvent::MemberLeft { timestamp, .. } => *timestamp,
            DirectoryEvent::CommunitiesSearched { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            DirectoryEvent::MemberJoined { .. } => "member_joined",
            DirectoryEvent::MemberLeft { .. } => "member_left",
            DirectoryEvent::CommunitiesSearched { .. } => "communities_searched",
        }
    }
}
