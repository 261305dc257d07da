// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Community Directory Aggregate
//!
//! [`CommunityDirectory`] is the aggregate root that owns the
//! [`HierarchyRegistry`] and the [`TagIndex`]. It is the only mutation path
//! for both: joins tag the leaf, leaves untag whatever the pruning walk
//! removed.
//!
//! Inbound requests reach it as a typed [`MembershipEnvelope`]; the raw
//! transport metadata is decoded in `crate::application::request_adapter`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::community::AgentJid;
use super::hierarchy::{HierarchyRegistry, LeaveOutcome};
use super::path::CommunityPath;
use super::snapshot::GroupsSnapshot;
use super::tag_index::TagIndex;

/// What a membership envelope asks the directory to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipChange {
    Join { tags: Vec<String> },
    Leave,
}

/// A decoded join/leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEnvelope {
    pub path: CommunityPath,
    pub domain: String,
    pub sender: AgentJid,
    pub change: MembershipChange,
}

impl MembershipEnvelope {
    pub fn join(path: CommunityPath, domain: impl Into<String>, sender: AgentJid, tags: Vec<String>) -> Self {
        Self {
            path,
            domain: domain.into(),
            sender,
            change: MembershipChange::Join { tags },
        }
    }

    pub fn leave(path: CommunityPath, domain: impl Into<String>, sender: AgentJid) -> Self {
        Self {
            path,
            domain: domain.into(),
            sender,
            change: MembershipChange::Leave,
        }
    }
}

/// Result of applying a [`MembershipEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MembershipOutcome {
    Joined { leaf: String },
    Left { pruned: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunityDirectory {
    hierarchy: HierarchyRegistry,
    tags: TagIndex,
}

impl CommunityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, path: &CommunityPath, domain: &str, sender: AgentJid, tags: &[String]) {
        self.hierarchy.join(path, domain, sender);
        self.tags.tag(path.leaf(), tags);
    }

    pub fn leave(&mut self, path: &CommunityPath, domain: &str, sender: &AgentJid) -> LeaveOutcome {
        let outcome = self.hierarchy.leave(path, domain, sender);
        if let LeaveOutcome::Left { pruned } = &outcome {
            self.tags.remove_nodes(pruned);
        }
        outcome
    }

    /// Apply one decoded envelope. A leave only removes the sender when it is
    /// a member of the leaf; otherwise the envelope joins the leaf untagged.
    pub fn apply(&mut self, envelope: &MembershipEnvelope) -> MembershipOutcome {
        let tags: &[String] = match &envelope.change {
            MembershipChange::Join { tags } => tags,
            MembershipChange::Leave => match self.leave(&envelope.path, &envelope.domain, &envelope.sender) {
                LeaveOutcome::Left { pruned } => return MembershipOutcome::Left { pruned },
                LeaveOutcome::NotAMember => &[],
            },
        };

        self.join(&envelope.path, &envelope.domain, envelope.sender.clone(), tags);
        MembershipOutcome::Joined {
            leaf: envelope.path.leaf().to_string(),
        }
    }

    pub fn search<S: AsRef<str>>(&self, tags: &[S]) -> BTreeSet<String> {
        self.tags.search(tags)
    }

    pub fn snapshot(&self) -> GroupsSnapshot {
        GroupsSnapshot::capture(&self.hierarchy)
    }

    pub fn hierarchy(&self) -> &HierarchyRegistry {
        &self.hierarchy
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }
}
