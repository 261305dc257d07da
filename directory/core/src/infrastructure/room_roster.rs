// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Room roster: the directory's view into the group-chat transport.
//!
//! Each hierarchy node corresponds to a multi-user chat room `<node>@<domain>`.
//! The roster reports who currently occupies a room so `GET /groups/refresh`
//! can show live occupancy next to the membership the directory recorded.
//!
//! [`InMemoryRoomRoster`] backs tests and standalone deployments; a chat
//! transport provides its own [`RoomRoster`] implementation.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::community::AgentJid;
use crate::domain::snapshot::GroupsSnapshot;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Chat transport unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read occupants of room {room}: {reason}")]
    Room { room: String, reason: String },
}

/// Chat room address for a hierarchy node.
pub fn room_jid(node: &str, domain: &str) -> String {
    format!("{}@{}", node, domain)
}

#[async_trait]
pub trait RoomRoster: Send + Sync {
    /// Current occupants of `room`. An unknown room has no occupants.
    async fn occupants(&self, room: &str) -> Result<Vec<AgentJid>, RosterError>;
}

/// Live occupant count for every node in `snapshot`, not counting the
/// directory's own presence in the room.
pub async fn live_occupancy(
    roster: &dyn RoomRoster,
    snapshot: &GroupsSnapshot,
    directory: &AgentJid,
) -> Result<BTreeMap<String, usize>, RosterError> {
    let mut counts = BTreeMap::new();
    for (name, _, domain) in &snapshot.nodes {
        let occupants = roster.occupants(&room_jid(name, domain)).await?;
        let count = occupants.iter().filter(|occupant| *occupant != directory).count();
        counts.insert(name.clone(), count);
    }
    Ok(counts)
}

#[derive(Clone, Default)]
pub struct InMemoryRoomRoster {
    rooms: Arc<RwLock<HashMap<String, Vec<AgentJid>>>>,
}

impl InMemoryRoomRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self, room: &str, occupant: AgentJid) {
        let mut rooms = self.rooms.write().await;
        let occupants = rooms.entry(room.to_string()).or_default();
        if !occupants.contains(&occupant) {
            occupants.push(occupant);
        }
    }

    pub async fn exit(&self, room: &str, occupant: &AgentJid) {
        let mut rooms = self.rooms.write().await;
        if let Some(occupants) = rooms.get_mut(room) {
            occupants.retain(|o| o != occupant);
            if occupants.is_empty() {
                rooms.remove(room);
            }
        }
    }
}

#[async_trait]
impl RoomRoster for InMemoryRoomRoster {
    async fn occupants(&self, room: &str) -> Result<Vec<AgentJid>, RosterError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(room).cloned().unwrap_or_default())
    }
}
