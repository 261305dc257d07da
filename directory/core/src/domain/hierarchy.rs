// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Community Hierarchy Registry
//!
//! Forest of named community nodes with per-node membership, parent → child
//! links and derived level categories.
//!
//! ## Invariants
//!
//! - A node is live iff it has at least one member or at least one outgoing
//!   link to a live node. Dead leaves are pruned transitively, leaf inward.
//! - A category exists iff at least one live node carries that level label.
//! - Link weights are stamped when a join traverses the link and may go stale.
//!
//! Nodes are keyed by their bare name (the last path segment). Two branches
//! sharing a segment name share one node, and the most recent join sets its
//! level and domain.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::community::{level_label, AgentJid, NodeRecord};
use super::path::CommunityPath;

/// Result of applying a leave to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LeaveOutcome {
    /// The sender was removed from the leaf; `pruned` lists removed nodes in
    /// removal order, leaf first.
    Left { pruned: Vec<String> },
    /// The sender was not a recorded member of the leaf; nothing changed.
    NotAMember,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyRegistry {
    nodes: BTreeMap<String, NodeRecord>,
    links: BTreeMap<(String, String), usize>,
    categories: BTreeSet<String>,
    node_members: BTreeMap<String, Vec<AgentJid>>,
}

impl HierarchyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `sender` as a member of the leaf of `path`, creating every node,
    /// link and category along the way.
    ///
    /// Joins are not idempotent: joining the same path twice appends the
    /// sender twice.
    pub fn join(&mut self, path: &CommunityPath, domain: &str, sender: AgentJid) {
        let mut parent: Option<&str> = None;
        let mut relabelled = false;

        for (depth, name) in path.segments().iter().enumerate() {
            let record = NodeRecord {
                level: depth,
                domain: domain.to_string(),
            };
            if let Some(previous) = self.nodes.insert(name.clone(), record) {
                if previous.level != depth {
                    debug!(
                        node = %name,
                        from = previous.level,
                        to = depth,
                        "Node relabelled by join at a different depth"
                    );
                    relabelled = true;
                }
            }

            self.node_members.entry(name.clone()).or_default();
            self.categories.insert(level_label(depth));

            if let Some(parent) = parent {
                let weight = (self.member_count(parent) + 1).max(self.member_count(name));
                self.links.insert((parent.to_string(), name.clone()), weight);
            }
            parent = Some(name);
        }

        self.node_members
            .entry(path.leaf().to_string())
            .or_default()
            .push(sender);

        // A relabel can leave the previous label without any node.
        if relabelled {
            self.retain_live_categories();
        }
    }

    /// Whether `sender` is currently recorded on the leaf of `path`.
    pub fn is_member(&self, path: &CommunityPath, sender: &AgentJid) -> bool {
        self.node_members
            .get(path.leaf())
            .is_some_and(|members| members.contains(sender))
    }

    /// Remove `sender` from the leaf of `path` and prune the branch that no
    /// longer has members or live children.
    ///
    /// The reverse walk stops at the first node that still has members or a
    /// child link: every ancestor above it has a live descendant. A pruned node
    /// loses every incoming link, so parents on other branches that are left
    /// empty and childless are pruned as well.
    pub fn leave(&mut self, path: &CommunityPath, domain: &str, sender: &AgentJid) -> LeaveOutcome {
        let Some(members) = self.node_members.get_mut(path.leaf()) else {
            return LeaveOutcome::NotAMember;
        };
        let Some(position) = members.iter().position(|member| member == sender) else {
            return LeaveOutcome::NotAMember;
        };
        members.remove(position);

        let segments = path.segments();
        let mut pruned: Vec<String> = Vec::new();
        let mut orphaned = Vec::new();

        for (depth, node) in segments.iter().enumerate().rev() {
            // Repeated segments name the same node.
            if pruned.contains(node) {
                continue;
            }
            if !self.is_dead(node) {
                break;
            }

            let (record, parents) = self.detach(node);
            if let Some(record) = record {
                if record.level != depth || record.domain != domain {
                    warn!(
                        node = %node,
                        stored = %record.label(),
                        stored_domain = %record.domain,
                        expected = %level_label(depth),
                        domain = %domain,
                        "Pruned node was registered under a different label"
                    );
                }
            }
            orphaned.extend(parents);
            pruned.push(node.clone());
        }

        while let Some(node) = orphaned.pop() {
            if pruned.contains(&node) || !self.nodes.contains_key(&node) || !self.is_dead(&node) {
                continue;
            }
            debug!(node = %node, "Pruning parent left without children");
            let (_, parents) = self.detach(&node);
            orphaned.extend(parents);
            pruned.push(node);
        }

        self.retain_live_categories();
        LeaveOutcome::Left { pruned }
    }

    /// Whether `name` has an outgoing link to another node.
    pub fn has_children(&self, name: &str) -> bool {
        self.links
            .range((name.to_string(), String::new())..)
            .take_while(|((parent, _), _)| parent == name)
            .any(|((_, child), _)| child != name)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&NodeRecord> {
        self.nodes.get(name)
    }

    pub fn members(&self, name: &str) -> &[AgentJid] {
        self.node_members.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn link_weight(&self, parent: &str, child: &str) -> Option<usize> {
        self.links
            .get(&(parent.to_string(), child.to_string()))
            .copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeRecord)> {
        self.nodes.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Links as `(parent, child, weight)`.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str, usize)> {
        self.links
            .iter()
            .map(|((parent, child), weight)| (parent.as_str(), child.as_str(), *weight))
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn node_members(&self) -> &BTreeMap<String, Vec<AgentJid>> {
        &self.node_members
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn member_count(&self, name: &str) -> usize {
        self.node_members.get(name).map_or(0, Vec::len)
    }

    fn is_dead(&self, name: &str) -> bool {
        self.node_members.get(name).is_none_or(Vec::is_empty) && !self.has_children(name)
    }

    /// Drop `name` with its members and every link into it. Returns the
    /// parents that linked to it.
    fn detach(&mut self, name: &str) -> (Option<NodeRecord>, Vec<String>) {
        self.node_members.remove(name);
        let record = self.nodes.remove(name);

        let mut parents = Vec::new();
        self.links.retain(|(parent, child), _| {
            if child != name {
                return true;
            }
            if parent != name {
                parents.push(parent.clone());
            }
            false
        });

        (record, parents)
    }

    fn retain_live_categories(&mut self) {
        let live: BTreeSet<String> = self.nodes.values().map(NodeRecord::label).collect();
        self.categories.retain(|category| live.contains(category));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> CommunityPath {
        CommunityPath::parse(raw).unwrap()
    }

    fn jid(raw: &str) -> AgentJid {
        AgentJid::from(raw)
    }

    fn expected_categories(registry: &HierarchyRegistry) -> BTreeSet<String> {
        registry.nodes().map(|(_, record)| record.label()).collect()
    }

    #[test]
    fn test_join_creates_nodes_links_and_categories() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("peak/a0/b0"), "localhost", jid("u1@localhost"));

        assert!(registry.contains_node("peak"));
        assert_eq!(registry.node("a0").unwrap().level, 1);
        assert_eq!(registry.node("b0").unwrap().domain, "localhost");
        assert!(registry.link_weight("peak", "a0").is_some());
        assert!(registry.link_weight("a0", "b0").is_some());
        assert_eq!(
            registry.categories().iter().cloned().collect::<Vec<_>>(),
            vec!["level0", "level1", "level2"]
        );
        assert!(registry.members("peak").is_empty());
        assert_eq!(registry.members("b0"), &[jid("u1@localhost")]);
    }

    #[test]
    fn test_double_join_appends_sender_twice() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("a/b"), "localhost", jid("s@localhost"));
        registry.join(&path("a/b"), "localhost", jid("s@localhost"));

        assert_eq!(registry.members("b").len(), 2);
    }

    #[test]
    fn test_leave_after_double_join_keeps_one_membership() {
        let mut registry = HierarchyRegistry::new();
        let sender = jid("s@localhost");
        registry.join(&path("a/b"), "localhost", sender.clone());
        registry.join(&path("a/b"), "localhost", sender.clone());

        let outcome = registry.leave(&path("a/b"), "localhost", &sender);
        assert_eq!(outcome, LeaveOutcome::Left { pruned: vec![] });
        assert_eq!(registry.members("b"), &[sender]);
    }

    #[test]
    fn test_link_weight_stamped_from_member_counts() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("a"), "localhost", jid("x"));
        registry.join(&path("a"), "localhost", jid("y"));
        registry.join(&path("a/b"), "localhost", jid("z"));

        // max(len(a) + 1, len(b)) = max(3, 0)
        assert_eq!(registry.link_weight("a", "b"), Some(3));

        // A leave never refreshes the stamp.
        registry.leave(&path("a"), "localhost", &jid("x"));
        assert_eq!(registry.link_weight("a", "b"), Some(3));
    }

    #[test]
    fn test_pruning_stops_at_branching_ancestor() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("a/b/c"), "localhost", jid("x"));
        registry.join(&path("a/b/d"), "localhost", jid("y"));

        let outcome = registry.leave(&path("a/b/c"), "localhost", &jid("x"));

        assert_eq!(outcome, LeaveOutcome::Left { pruned: vec!["c".to_string()] });
        assert!(!registry.contains_node("c"));
        assert!(registry.contains_node("b"));
        assert!(registry.contains_node("a"));
        assert!(registry.link_weight("b", "c").is_none());
        assert!(registry.link_weight("b", "d").is_some());
        assert!(!registry.node_members().contains_key("c"));
    }

    #[test]
    fn test_leave_prunes_whole_branch_when_empty() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("a/b/c"), "localhost", jid("x"));

        let outcome = registry.leave(&path("a/b/c"), "localhost", &jid("x"));

        assert_eq!(
            outcome,
            LeaveOutcome::Left {
                pruned: vec!["c".to_string(), "b".to_string(), "a".to_string()]
            }
        );
        assert!(registry.is_empty());
        assert!(registry.categories().is_empty());
        assert_eq!(registry.links().count(), 0);
        assert!(registry.node_members().is_empty());
    }

    #[test]
    fn test_leave_for_unknown_member_is_noop() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("a/b"), "localhost", jid("x"));
        let before = registry.clone();

        assert_eq!(
            registry.leave(&path("a/b"), "localhost", &jid("stranger")),
            LeaveOutcome::NotAMember
        );
        assert_eq!(
            registry.leave(&path("never/seen"), "localhost", &jid("x")),
            LeaveOutcome::NotAMember
        );
        assert_eq!(registry, before);
    }

    #[test]
    fn test_second_leave_is_noop() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("a/b"), "localhost", jid("x"));
        registry.join(&path("a/c"), "localhost", jid("y"));

        registry.leave(&path("a/b"), "localhost", &jid("x"));
        let after_first = registry.clone();

        assert_eq!(
            registry.leave(&path("a/b"), "localhost", &jid("x")),
            LeaveOutcome::NotAMember
        );
        assert_eq!(registry, after_first);
    }

    #[test]
    fn test_join_then_leave_is_path_neutral() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("root/shared"), "localhost", jid("resident"));
        let before = registry.clone();

        registry.join(&path("root/other/deep"), "localhost", jid("visitor"));
        registry.leave(&path("root/other/deep"), "localhost", &jid("visitor"));

        assert_eq!(registry, before);
    }

    #[test]
    fn test_relabel_overwrites_level_and_drops_orphaned_category() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("x/a"), "localhost", jid("u1"));
        registry.join(&path("a"), "localhost", jid("u2"));

        assert_eq!(registry.node("a").unwrap().level, 0);
        assert_eq!(registry.categories(), &expected_categories(&registry));
        assert!(!registry.categories().contains("level1"));
    }

    #[test]
    fn test_categories_track_live_nodes() {
        let mut registry = HierarchyRegistry::new();
        let steps: [(&str, &str, bool); 6] = [
            ("a/b/c", "u1", false),
            ("a/d", "u2", false),
            ("e", "u3", false),
            ("a/b/c", "u1", true),
            ("e", "u3", true),
            ("a/d", "u2", true),
        ];

        for (raw, sender, leave) in steps {
            if leave {
                registry.leave(&path(raw), "localhost", &jid(sender));
            } else {
                registry.join(&path(raw), "localhost", jid(sender));
            }
            assert_eq!(registry.categories(), &expected_categories(&registry), "after {raw}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_pruned_shared_leaf_drops_links_from_every_parent() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("x/a"), "localhost", jid("u1"));
        registry.join(&path("y/a"), "localhost", jid("u2"));
        registry.join(&path("y/b"), "localhost", jid("u3"));

        registry.leave(&path("x/a"), "localhost", &jid("u1"));
        let outcome = registry.leave(&path("y/a"), "localhost", &jid("u2"));

        assert_eq!(
            outcome,
            LeaveOutcome::Left {
                pruned: vec!["a".to_string(), "x".to_string()]
            }
        );
        assert!(registry.link_weight("x", "a").is_none());
        assert!(registry.link_weight("y", "a").is_none());
        assert!(registry.contains_node("y"));
        assert!(!registry.contains_node("x"));
        assert_eq!(registry.categories(), &expected_categories(&registry));
    }

    #[test]
    fn test_repeated_segment_is_pruned_once() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("a/a"), "localhost", jid("u1"));

        let outcome = registry.leave(&path("a/a"), "localhost", &jid("u1"));

        assert_eq!(outcome, LeaveOutcome::Left { pruned: vec!["a".to_string()] });
        assert!(registry.is_empty());
        assert_eq!(registry.links().count(), 0);
    }

    #[test]
    fn test_has_children_ignores_other_parents_with_common_prefix() {
        let mut registry = HierarchyRegistry::new();
        registry.join(&path("ab/c"), "localhost", jid("u1"));
        registry.join(&path("a"), "localhost", jid("u2"));

        assert!(registry.has_children("ab"));
        assert!(!registry.has_children("a"));
    }
}
