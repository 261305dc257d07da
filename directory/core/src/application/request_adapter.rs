// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request Adapter
//!
//! Translates inbound requests into typed directory envelopes and search
//! results back into replies. Stateless: every function here can be
//! exercised without a transport.
//!
//! Two encodings are accepted:
//!
//! - **Message metadata**: the chat substrate's string key/value bag.
//!   `resource` selects the handler (`treehierarchy` or `searchgroup`),
//!   `tags` is a JSON-encoded list and `leave` a truthy string.
//! - **JSON bodies**: [`MembershipRequest`] and [`SearchRequest`] as posted
//!   to the HTTP API.
//!
//! In both cases the sender comes from message provenance, never from the
//! payload, and validation happens before anything is queued.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::community::AgentJid;
use crate::domain::directory::MembershipEnvelope;
use crate::domain::path::{CommunityPath, PathError};

pub const RESOURCE_KEY: &str = "resource";
pub const RESOURCE_HIERARCHY: &str = "treehierarchy";
pub const RESOURCE_SEARCH: &str = "searchgroup";

pub const PATH_KEY: &str = "path";
pub const DOMAIN_KEY: &str = "domain";
pub const TAGS_KEY: &str = "tags";
pub const LEAVE_KEY: &str = "leave";
pub const COMMUNITIES_KEY: &str = "communities";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid community path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Invalid tags: {0}")]
    InvalidTags(String),

    #[error("Search requires at least one tag")]
    EmptyTags,

    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

/// Join or leave request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRequest {
    pub path: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave: Option<bool>,
}

impl MembershipRequest {
    pub fn join(path: impl Into<String>, domain: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            path: path.into(),
            domain: domain.into(),
            tags: Some(tags),
            leave: None,
        }
    }

    pub fn leave(path: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            domain: domain.into(),
            tags: None,
            leave: Some(true),
        }
    }

    /// Encode as chat message metadata addressed to the directory.
    pub fn to_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::from([
            (RESOURCE_KEY.to_string(), RESOURCE_HIERARCHY.to_string()),
            (PATH_KEY.to_string(), self.path.clone()),
            (DOMAIN_KEY.to_string(), self.domain.clone()),
        ]);
        if let Some(tags) = &self.tags {
            metadata.insert(TAGS_KEY.to_string(), encode_list(tags));
        }
        if self.leave == Some(true) {
            metadata.insert(LEAVE_KEY.to_string(), "true".to_string());
        }
        metadata
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub tags: Vec<String>,
}

impl SearchRequest {
    pub fn to_metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            (RESOURCE_KEY.to_string(), RESOURCE_SEARCH.to_string()),
            (TAGS_KEY.to_string(), encode_list(&self.tags)),
        ])
    }
}

/// Reply to a search: the matching community names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReply {
    pub communities: Vec<String>,
}

impl SearchReply {
    pub fn to_metadata(&self) -> HashMap<String, String> {
        HashMap::from([(COMMUNITIES_KEY.to_string(), encode_list(&self.communities))])
    }

    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, RequestError> {
        let raw = metadata
            .get(COMMUNITIES_KEY)
            .ok_or(RequestError::MissingField(COMMUNITIES_KEY))?;
        let communities = serde_json::from_str(raw).map_err(|e| RequestError::InvalidTags(e.to_string()))?;
        Ok(Self { communities })
    }
}

/// A validated, non-empty tag query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    tags: Vec<String>,
}

impl SearchQuery {
    pub fn new(tags: Vec<String>) -> Result<Self, RequestError> {
        if tags.is_empty() {
            return Err(RequestError::EmptyTags);
        }
        Ok(Self { tags })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// A chat message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: AgentJid,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRequest {
    Membership(MembershipEnvelope),
    Search(SearchQuery),
}

pub fn decode_membership(request: MembershipRequest, sender: AgentJid) -> Result<MembershipEnvelope, RequestError> {
    let path = CommunityPath::parse(&request.path)?;
    if request.leave.unwrap_or(false) {
        Ok(MembershipEnvelope::leave(path, request.domain, sender))
    } else {
        Ok(MembershipEnvelope::join(
            path,
            request.domain,
            sender,
            request.tags.unwrap_or_default(),
        ))
    }
}

pub fn decode_search(request: SearchRequest) -> Result<SearchQuery, RequestError> {
    SearchQuery::new(request.tags)
}

/// Decode a transport message by its `resource` metadata.
pub fn decode_message(message: &InboundMessage) -> Result<DecodedRequest, RequestError> {
    let metadata = &message.metadata;
    let resource = metadata
        .get(RESOURCE_KEY)
        .ok_or(RequestError::MissingField(RESOURCE_KEY))?;

    match resource.as_str() {
        RESOURCE_HIERARCHY => {
            let request = MembershipRequest {
                path: required(metadata, PATH_KEY)?,
                domain: required(metadata, DOMAIN_KEY)?,
                tags: metadata.get(TAGS_KEY).map(|raw| decode_list(raw)).transpose()?,
                leave: metadata.get(LEAVE_KEY).map(|flag| is_truthy(flag)),
            };
            decode_membership(request, message.sender.clone()).map(DecodedRequest::Membership)
        }
        RESOURCE_SEARCH => {
            let raw = metadata.get(TAGS_KEY).ok_or(RequestError::MissingField(TAGS_KEY))?;
            SearchQuery::new(decode_list(raw)?).map(DecodedRequest::Search)
        }
        other => Err(RequestError::UnknownResource(other.to_string())),
    }
}

pub fn encode_search_reply(communities: BTreeSet<String>) -> SearchReply {
    SearchReply {
        communities: communities.into_iter().collect(),
    }
}

fn required(metadata: &HashMap<String, String>, key: &'static str) -> Result<String, RequestError> {
    metadata.get(key).cloned().ok_or(RequestError::MissingField(key))
}

fn decode_list(raw: &str) -> Result<Vec<String>, RequestError> {
    serde_json::from_str(raw).map_err(|e| RequestError::InvalidTags(e.to_string()))
}

fn encode_list(items: &[String]) -> String {
    // Serializing a list of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn is_truthy(flag: &str) -> bool {
    matches!(flag.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::directory::MembershipChange;

    fn message(pairs: &[(&str, &str)]) -> InboundMessage {
        InboundMessage {
            sender: AgentJid::from("u1@localhost/agent"),
            metadata: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_decode_join_from_metadata() {
        let decoded = decode_message(&message(&[
            ("resource", "treehierarchy"),
            ("path", "peak/a0/b0"),
            ("domain", "localhost"),
            ("tags", r#"["t1","t2"]"#),
        ]))
        .unwrap();

        let DecodedRequest::Membership(envelope) = decoded else {
            panic!("expected membership envelope");
        };
        assert_eq!(envelope.path.leaf(), "b0");
        assert_eq!(envelope.sender.as_str(), "u1@localhost/agent");
        assert_eq!(
            envelope.change,
            MembershipChange::Join { tags: vec!["t1".to_string(), "t2".to_string()] }
        );
    }

    #[test]
    fn test_absent_tags_decode_as_empty() {
        let envelope = decode_membership(
            MembershipRequest {
                path: "a/b".to_string(),
                domain: "localhost".to_string(),
                tags: None,
                leave: None,
            },
            AgentJid::from("u1"),
        )
        .unwrap();
        assert_eq!(envelope.change, MembershipChange::Join { tags: vec![] });
    }

    #[test]
    fn test_leave_flag_variants() {
        for flag in ["true", "True", "1", "yes"] {
            let decoded = decode_message(&message(&[
                ("resource", "treehierarchy"),
                ("path", "a/b"),
                ("domain", "localhost"),
                ("leave", flag),
            ]))
            .unwrap();
            assert!(
                matches!(decoded, DecodedRequest::Membership(ref e) if e.change == MembershipChange::Leave),
                "{flag}"
            );
        }

        for flag in ["false", "on", ""] {
            let decoded = decode_message(&message(&[
                ("resource", "treehierarchy"),
                ("path", "a/b"),
                ("domain", "localhost"),
                ("leave", flag),
            ]))
            .unwrap();
            assert!(
                matches!(decoded, DecodedRequest::Membership(ref e) if e.change != MembershipChange::Leave),
                "{flag}"
            );
        }
    }

    #[test]
    fn test_malformed_path_rejected_before_registry() {
        let err = decode_membership(MembershipRequest::join("a//b", "localhost", vec![]), AgentJid::from("u1"))
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidPath(PathError::EmptySegment { .. })));

        let err = decode_membership(MembershipRequest::join("", "localhost", vec![]), AgentJid::from("u1"))
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidPath(PathError::Empty)));
    }

    #[test]
    fn test_missing_fields_and_bad_tags() {
        let err = decode_message(&message(&[("resource", "treehierarchy"), ("path", "a")])).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("domain")));

        let err = decode_message(&message(&[
            ("resource", "treehierarchy"),
            ("path", "a"),
            ("domain", "localhost"),
            ("tags", "not json"),
        ]))
        .unwrap_err();
        assert!(matches!(err, RequestError::InvalidTags(_)));

        let err = decode_message(&message(&[("resource", "graph")])).unwrap_err();
        assert!(matches!(err, RequestError::UnknownResource(_)));
    }

    #[test]
    fn test_search_requires_tags() {
        assert!(matches!(
            decode_search(SearchRequest { tags: vec![] }),
            Err(RequestError::EmptyTags)
        ));
        let err = decode_message(&message(&[("resource", "searchgroup"), ("tags", "[]")])).unwrap_err();
        assert!(matches!(err, RequestError::EmptyTags));
    }

    #[test]
    fn test_client_metadata_decodes_to_same_envelope() {
        let request = MembershipRequest::leave("peak/a0", "localhost");
        let inbound = InboundMessage {
            sender: AgentJid::from("u2"),
            metadata: request.to_metadata(),
        };

        let decoded = decode_message(&inbound).unwrap();
        let direct = decode_membership(request, AgentJid::from("u2")).unwrap();
        assert_eq!(decoded, DecodedRequest::Membership(direct));
    }

    #[test]
    fn test_search_reply_metadata() {
        let reply = encode_search_reply(BTreeSet::from(["b0".to_string(), "a0".to_string()]));
        assert_eq!(reply.communities, vec!["a0", "b0"]);

        let metadata = reply.to_metadata();
        assert_eq!(metadata["communities"], r#"["a0","b0"]"#);
        assert_eq!(SearchReply::from_metadata(&metadata).unwrap(), reply);
    }
}
