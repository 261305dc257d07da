// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Layer
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`request_adapter`] | Decode transport requests into envelopes, encode search replies |
//! | [`coordinator`] | Single-writer task owning the `CommunityDirectory` |
//! | [`directory_service`] | `DirectoryService` use-case trait consumed by the API |

pub mod coordinator;
pub mod directory_service;
pub mod request_adapter;
