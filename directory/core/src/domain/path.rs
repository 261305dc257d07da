// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Community Path Model
//!
//! Parses a `/`-delimited hierarchy path (`"peak/a0/b0"`) into its ordered
//! segments, root first. A parsed [`CommunityPath`] is always non-empty and
//! never contains an empty segment, so the registry can index it freely.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Reject malformed paths before they reach the registry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Path parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Community path is empty")]
    Empty,

    #[error("Community path '{path}' has an empty segment at position {index}")]
    EmptySegment { path: String, index: usize },
}

/// A validated community hierarchy path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommunityPath {
    segments: Vec<String>,
}

impl CommunityPath {
    /// Parse a raw path string.
    ///
    /// # Examples
    /// ```
    /// use aegis_directory::domain::path::CommunityPath;
    ///
    /// let path = CommunityPath::parse("peak/a0/b0").unwrap();
    /// assert_eq!(path.leaf(), "b0");
    /// assert_eq!(path.depth(), 3);
    ///
    /// assert!(CommunityPath::parse("peak//b0").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        if let Some(index) = segments.iter().position(String::is_empty) {
            return Err(PathError::EmptySegment {
                path: raw.to_string(),
                index,
            });
        }

        Ok(Self { segments })
    }

    /// Segments ordered root → leaf.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment: the node that directly receives a joining member.
    pub fn leaf(&self) -> &str {
        // Parsing guarantees at least one segment.
        &self.segments[self.segments.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for CommunityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for CommunityPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CommunityPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CommunityPath> for String {
    fn from(path: CommunityPath) -> Self {
        path.to_string()
    }
}
