// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Directory Coordinator
//!
//! Serializes every membership mutation through one writer task.
//!
//! # Architecture
//!
//! ```text
//! DirectoryHandle::submit ──► mpsc (bounded) ──► writer task
//!                                                   │ write lock (sync, no await)
//!                                                   ▼
//!                                          CommunityDirectory::apply
//!                                                   │
//!                                                   ▼
//!                                         EventBus + metrics
//! ```
//!
//! Reads (`search`, `snapshot`) take the read lock directly from the
//! handle, so they observe either the state before a mutation or after it,
//! never an intermediate one. Envelopes are applied in arrival order.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::directory::{CommunityDirectory, MembershipChange, MembershipEnvelope, MembershipOutcome};
use crate::domain::events::DirectoryEvent;
use crate::domain::snapshot::GroupsSnapshot;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::room_roster::RosterError;

use super::request_adapter::{RequestError, SearchQuery};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory writer has stopped")]
    QueueClosed,

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

enum Command {
    Apply(MembershipEnvelope),
    Flush(oneshot::Sender<()>),
}

pub struct DirectoryCoordinator;

impl DirectoryCoordinator {
    /// Start the writer task over an empty directory.
    pub fn spawn(queue_capacity: usize, event_bus: EventBus) -> (DirectoryHandle, JoinHandle<()>) {
        Self::spawn_with(CommunityDirectory::new(), queue_capacity, event_bus)
    }

    pub fn spawn_with(
        directory: CommunityDirectory,
        queue_capacity: usize,
        event_bus: EventBus,
    ) -> (DirectoryHandle, JoinHandle<()>) {
        let state = Arc::new(RwLock::new(directory));
        let (commands, receiver) = mpsc::channel(queue_capacity.max(1));

        let worker = tokio::spawn(run_writer(state.clone(), receiver, event_bus.clone()));

        (
            DirectoryHandle {
                state,
                commands,
                event_bus,
            },
            worker,
        )
    }
}

async fn run_writer(
    state: Arc<RwLock<CommunityDirectory>>,
    mut receiver: mpsc::Receiver<Command>,
    event_bus: EventBus,
) {
    info!("Directory writer started");

    while let Some(command) = receiver.recv().await {
        match command {
            Command::Apply(envelope) => {
                let (outcome, node_count) = {
                    let mut directory = state.write();
                    let outcome = directory.apply(&envelope);
                    (outcome, directory.hierarchy().node_count())
                };
                metrics::gauge!("aegis_directory_nodes").set(node_count as f64);
                record_outcome(&event_bus, envelope, outcome);
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    info!("Directory writer stopped");
}

fn record_outcome(event_bus: &EventBus, envelope: MembershipEnvelope, outcome: MembershipOutcome) {
    let path = envelope.path.to_string();
    let timestamp = Utc::now();

    let event = match outcome {
        MembershipOutcome::Joined { leaf } => {
            let tags = match envelope.change {
                MembershipChange::Join { tags } => tags,
                MembershipChange::Leave => {
                    warn!(sender = %envelope.sender, path = %path, "Leave from non-member, joining instead");
                    Vec::new()
                }
            };
            info!(sender = %envelope.sender, path = %path, leaf = %leaf, "Member entering community");
            metrics::counter!("aegis_directory_joins_total").increment(1);
            DirectoryEvent::MemberJoined {
                path,
                domain: envelope.domain,
                sender: envelope.sender,
                tags,
                timestamp,
            }
        }
        MembershipOutcome::Left { pruned } => {
            info!(sender = %envelope.sender, path = %path, pruned = ?pruned, "Member leaving community");
            metrics::counter!("aegis_directory_leaves_total").increment(1);
            DirectoryEvent::MemberLeft {
                path,
                domain: envelope.domain,
                sender: envelope.sender,
                pruned,
                timestamp,
            }
        }
    };

    event_bus.publish(event);
}

/// Cloneable access to a running coordinator.
#[derive(Clone)]
pub struct DirectoryHandle {
    state: Arc<RwLock<CommunityDirectory>>,
    commands: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl DirectoryHandle {
    /// Queue an envelope. Waits while the queue is full.
    pub async fn submit(&self, envelope: MembershipEnvelope) -> Result<(), DirectoryError> {
        self.commands
            .send(Command::Apply(envelope))
            .await
            .map_err(|_| DirectoryError::QueueClosed)
    }

    /// Resolve once every envelope submitted before this call is applied.
    pub async fn flush(&self) -> Result<(), DirectoryError> {
        let (done, applied) = oneshot::channel();
        self.commands
            .send(Command::Flush(done))
            .await
            .map_err(|_| DirectoryError::QueueClosed)?;
        applied.await.map_err(|_| DirectoryError::QueueClosed)
    }

    pub fn search(&self, query: &SearchQuery) -> BTreeSet<String> {
        let matches = self.state.read().search(query.tags());

        metrics::counter!("aegis_directory_searches_total").increment(1);
        debug!(tags = ?query.tags(), matches = matches.len(), "Answered community search");
        self.event_bus.publish(DirectoryEvent::CommunitiesSearched {
            tags: query.tags().to_vec(),
            matches: matches.len(),
            timestamp: Utc::now(),
        });

        matches
    }

    pub fn snapshot(&self) -> GroupsSnapshot {
        self.state.read().snapshot()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::community::AgentJid;
    use crate::domain::path::CommunityPath;

    fn join(path: &str, sender: &str, tags: &[&str]) -> MembershipEnvelope {
        MembershipEnvelope::join(
            CommunityPath::parse(path).unwrap(),
            "localhost",
            AgentJid::from(sender),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    fn leave(path: &str, sender: &str) -> MembershipEnvelope {
        MembershipEnvelope::leave(CommunityPath::parse(path).unwrap(), "localhost", AgentJid::from(sender))
    }

    fn query(tags: &[&str]) -> SearchQuery {
        SearchQuery::new(tags.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_flush_observes_submitted_envelopes() {
        let (handle, _worker) = DirectoryCoordinator::spawn(8, EventBus::new(16));

        handle.submit(join("peak/a0/b0", "u1", &["t1"])).await.unwrap();
        handle.flush().await.unwrap();

        assert_eq!(handle.search(&query(&["t1"])), BTreeSet::from(["b0".to_string()]));
        assert_eq!(handle.snapshot().nodes.len(), 3);
    }

    #[tokio::test]
    async fn test_envelopes_apply_in_arrival_order() {
        let (handle, _worker) = DirectoryCoordinator::spawn(2, EventBus::new(16));

        // A leave ahead of any join records the sender; the following leave removes it.
        handle.submit(leave("a/b", "u1")).await.unwrap();
        handle.submit(leave("a/b", "u1")).await.unwrap();
        handle.submit(join("a/c", "u2", &[])).await.unwrap();
        handle.submit(join("a/c", "u3", &[])).await.unwrap();
        handle.submit(leave("a/c", "u2")).await.unwrap();
        handle.flush().await.unwrap();

        let snapshot = handle.snapshot();
        let names: Vec<_> = snapshot.nodes.iter().map(|(n, _, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(snapshot.node_members["c"], vec![AgentJid::from("u3")]);
    }

    #[tokio::test]
    async fn test_outcomes_are_published() {
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let (handle, _worker) = DirectoryCoordinator::spawn(4, bus);

        handle.submit(join("a/b", "u1", &["x"])).await.unwrap();
        handle.submit(leave("a/b", "u9")).await.unwrap();
        handle.submit(leave("a/b", "u1")).await.unwrap();
        handle.flush().await.unwrap();
        handle.search(&query(&["x"]));

        let kinds: Vec<_> = (0..4).map(|_| events.try_recv().unwrap().event_type()).collect();
        assert_eq!(kinds, vec!["member_joined", "member_joined", "member_left", "communities_searched"]);
    }

    #[tokio::test]
    async fn test_submit_after_writer_stops_fails() {
        let (handle, worker) = DirectoryCoordinator::spawn(1, EventBus::new(4));
        worker.abort();
        let _ = worker.await;

        assert!(matches!(
            handle.submit(join("a", "u1", &[])).await,
            Err(DirectoryError::QueueClosed)
        ));
    }
}
