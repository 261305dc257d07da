// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Read-only projections of the hierarchy for the dashboard API.
//!
//! Serialized shape (`GET /groups`):
//!
//! ```json
//! {
//!   "nodes": [["peak", "level0", "localhost"]],
//!   "links": [["peak", "a0"]],
//!   "categories": ["level0", "level1"],
//!   "node_members": {"a0": ["u1@localhost"]}
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::community::AgentJid;
use super::hierarchy::HierarchyRegistry;

/// `(name, level label, domain)`
pub type NodeView = (String, String, String);

/// `(parent, child)`
pub type LinkView = (String, String);

/// Materialized copy of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupsSnapshot {
    pub nodes: Vec<NodeView>,
    pub links: Vec<LinkView>,
    pub categories: Vec<String>,
    pub node_members: BTreeMap<String, Vec<AgentJid>>,
}

impl GroupsSnapshot {
    pub fn capture(registry: &HierarchyRegistry) -> Self {
        Self {
            nodes: registry
                .nodes()
                .map(|(name, record)| (name.to_string(), record.label(), record.domain.clone()))
                .collect(),
            links: registry
                .links()
                .map(|(parent, child, _)| (parent.to_string(), child.to_string()))
                .collect(),
            categories: registry.categories().iter().cloned().collect(),
            node_members: registry.node_members().clone(),
        }
    }

    /// Replace recorded members with live occupant counts.
    pub fn with_occupancy(self, counts: BTreeMap<String, usize>) -> RefreshedGroups {
        RefreshedGroups {
            nodes: self.nodes,
            links: self.links,
            categories: self.categories,
            node_members: counts,
        }
    }
}

/// Snapshot whose `node_members` holds live room occupancy (`GET /groups/refresh`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedGroups {
    pub nodes: Vec<NodeView>,
    pub links: Vec<LinkView>,
    pub categories: Vec<String>,
    pub node_members: BTreeMap<String, usize>,
}
