// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Directory Service
//!
//! Use-case boundary between the transports (HTTP API, chat messages) and
//! the coordinator. Requests are validated here, mutations are queued, and
//! reads are answered from the current state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::community::AgentJid;
use crate::domain::events::DirectoryEvent;
use crate::domain::snapshot::{GroupsSnapshot, RefreshedGroups};
use crate::infrastructure::room_roster::{live_occupancy, RoomRoster};

use super::coordinator::{DirectoryError, DirectoryHandle};
use super::request_adapter::{
    decode_membership, decode_message, decode_search, encode_search_reply, DecodedRequest, InboundMessage,
    MembershipRequest, SearchReply, SearchRequest,
};

#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Validate and queue a join or leave. Returns once the request is
    /// accepted, not once it is applied.
    async fn submit_membership(&self, request: MembershipRequest, sender: AgentJid) -> Result<(), DirectoryError>;

    async fn search(&self, request: SearchRequest) -> Result<SearchReply, DirectoryError>;

    async fn groups(&self) -> GroupsSnapshot;

    /// Current hierarchy with live room occupancy in place of recorded members.
    async fn refresh_groups(&self) -> Result<RefreshedGroups, DirectoryError>;

    /// Dispatch a chat message. Searches produce reply metadata; membership
    /// changes produce none.
    async fn handle_message(&self, message: InboundMessage) -> Result<Option<HashMap<String, String>>, DirectoryError>;

    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DirectoryEvent>;
}

pub struct StandardDirectoryService {
    handle: DirectoryHandle,
    roster: Arc<dyn RoomRoster>,
    directory_jid: AgentJid,
}

impl StandardDirectoryService {
    pub fn new(handle: DirectoryHandle, roster: Arc<dyn RoomRoster>, directory_jid: AgentJid) -> Self {
        Self {
            handle,
            roster,
            directory_jid,
        }
    }

    pub fn handle(&self) -> &DirectoryHandle {
        &self.handle
    }
}

#[async_trait]
impl DirectoryService for StandardDirectoryService {
    async fn submit_membership(&self, request: MembershipRequest, sender: AgentJid) -> Result<(), DirectoryError> {
        let envelope = decode_membership(request, sender)?;
        debug!(sender = %envelope.sender, path = %envelope.path, "Decoded membership request");
        self.handle.submit(envelope).await
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchReply, DirectoryError> {
        let query = decode_search(request)?;
        Ok(encode_search_reply(self.handle.search(&query)))
    }

    async fn groups(&self) -> GroupsSnapshot {
        self.handle.snapshot()
    }

    async fn refresh_groups(&self) -> Result<RefreshedGroups, DirectoryError> {
        let snapshot = self.handle.snapshot();
        let counts = live_occupancy(self.roster.as_ref(), &snapshot, &self.directory_jid).await?;
        Ok(snapshot.with_occupancy(counts))
    }

    async fn handle_message(&self, message: InboundMessage) -> Result<Option<HashMap<String, String>>, DirectoryError> {
        let decoded = decode_message(&message).inspect_err(|e| {
            warn!(sender = %message.sender, error = %e, "Discarding malformed directory message");
        })?;

        match decoded {
            DecodedRequest::Membership(envelope) => {
                debug!(sender = %envelope.sender, path = %envelope.path, "Decoded membership message");
                self.handle.submit(envelope).await?;
                Ok(None)
            }
            DecodedRequest::Search(query) => {
                let reply = encode_search_reply(self.handle.search(&query));
                Ok(Some(reply.to_metadata()))
            }
        }
    }

    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DirectoryEvent> {
        self.handle.event_bus().subscribe_raw()
    }
}
