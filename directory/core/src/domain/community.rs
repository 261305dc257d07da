// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Community value objects shared by the registry, tag index and snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an agent occupying a community (its chat JID).
///
/// Always taken from message provenance, never from a request body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentJid(pub String);

impl AgentJid {
    pub fn new(jid: impl Into<String>) -> Self {
        Self(jid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentJid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentJid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// JID under which the directory facilitator itself is reachable.
pub fn directory_jid(domain: &str) -> AgentJid {
    AgentJid(format!("df@{}/admin", domain))
}

/// Category label for a hierarchy depth (`0 → "level0"`).
pub fn level_label(depth: usize) -> String {
    format!("level{}", depth)
}

/// Stored attributes of a hierarchy node. The node's identity is its name,
/// which is the map key in [`crate::domain::hierarchy::HierarchyRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Depth at which the node was most recently traversed by a join.
    pub level: usize,
    /// Server domain carried by that join.
    pub domain: String,
}

impl NodeRecord {
    pub fn label(&self) -> String {
        level_label(self.level)
    }
}
