// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tag index for community discovery.
//!
//! Maps each tag to the set of leaf nodes it was attached to at join time.
//! Searches are a true AND across every supplied tag.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach every tag in `tags` to `node`.
    pub fn tag<S: AsRef<str>>(&mut self, node: &str, tags: &[S]) {
        for tag in tags {
            self.entries
                .entry(tag.as_ref().to_string())
                .or_default()
                .insert(node.to_string());
        }
    }

    /// Nodes registered under `tag`; an unused tag yields the empty set.
    pub fn lookup(&self, tag: &str) -> BTreeSet<String> {
        self.entries.get(tag).cloned().unwrap_or_default()
    }

    /// Nodes carrying every tag in `tags`.
    ///
    /// An empty tag list matches nothing.
    pub fn search<S: AsRef<str>>(&self, tags: &[S]) -> BTreeSet<String> {
        let Some((first, rest)) = tags.split_first() else {
            return BTreeSet::new();
        };

        let mut communities = self.lookup(first.as_ref());
        for tag in rest {
            if communities.is_empty() {
                break;
            }
            let tagged = self.entries.get(tag.as_ref());
            communities.retain(|node| tagged.is_some_and(|nodes| nodes.contains(node)));
        }
        communities
    }

    /// Forget pruned nodes. Tags left without nodes are dropped.
    pub fn remove_nodes<S: AsRef<str>>(&mut self, nodes: &[S]) {
        if nodes.is_empty() {
            return;
        }
        self.entries.retain(|_, tagged| {
            for node in nodes {
                tagged.remove(node.as_ref());
            }
            !tagged.is_empty()
        });
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
