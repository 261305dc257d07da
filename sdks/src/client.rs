// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::time::Duration;

use aegis_directory::application::request_adapter::{MembershipRequest, SearchReply, SearchRequest};
use aegis_directory::domain::{AgentJid, GroupsSnapshot, RefreshedGroups};
use aegis_directory::presentation::api::SENDER_HEADER;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;

/// How long a search waits for the directory's reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum DirectoryClientError {
    #[error("Directory did not reply within {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Directory rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the AEGIS community directory.
///
/// Every membership call is made on behalf of `sender`, which the directory
/// records as the member.
pub struct DirectoryClient {
    base_url: String,
    client: Client,
    sender: AgentJid,
    api_key: Option<String>,
    reply_timeout: Duration,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>, sender: AgentJid) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            sender,
            api_key: None,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Set the API key for authentication.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn sender(&self) -> &AgentJid {
        &self.sender
    }

    /// Join the leaf of `path`, tagging it with `tags`.
    pub async fn join_community(
        &self,
        path: &str,
        domain: &str,
        tags: Vec<String>,
    ) -> Result<(), DirectoryClientError> {
        self.submit(&MembershipRequest::join(path, domain, tags)).await
    }

    pub async fn leave_community(&self, path: &str, domain: &str) -> Result<(), DirectoryClientError> {
        self.submit(&MembershipRequest::leave(path, domain)).await
    }

    /// Names of the communities carrying every tag in `tags`.
    ///
    /// Gives up with [`DirectoryClientError::Timeout`] when the directory
    /// does not answer within the reply timeout.
    pub async fn search_communities(&self, tags: Vec<String>) -> Result<Vec<String>, DirectoryClientError> {
        let request = self
            .authorized(self.client.post(self.url("/api/v1/communities/search")))
            .json(&SearchRequest { tags });

        let exchange = async {
            let response = check(request.send().await?).await?;
            Ok::<_, DirectoryClientError>(response.json::<SearchReply>().await?)
        };

        let reply = tokio::time::timeout(self.reply_timeout, exchange)
            .await
            .map_err(|_| DirectoryClientError::Timeout(self.reply_timeout))??;

        Ok(reply.communities)
    }

    pub async fn groups(&self) -> Result<GroupsSnapshot, DirectoryClientError> {
        let request = self.authorized(self.client.get(self.url("/groups")));
        Ok(check(request.send().await?).await?.json().await?)
    }

    pub async fn refresh_groups(&self) -> Result<RefreshedGroups, DirectoryClientError> {
        let request = self.authorized(self.client.get(self.url("/groups/refresh")));
        Ok(check(request.send().await?).await?.json().await?)
    }

    async fn submit(&self, membership: &MembershipRequest) -> Result<(), DirectoryClientError> {
        let request = self
            .authorized(self.client.post(self.url("/api/v1/communities/membership")))
            .header(SENDER_HEADER, self.sender.as_str())
            .json(membership);

        check(request.send().await?).await?;
        Ok(())
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

async fn check(response: Response) -> Result<Response, DirectoryClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| parsed.error)
        .unwrap_or(body);

    Err(DirectoryClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}
