// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Infrastructure Layer
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`event_bus`] | `EventBus` broadcast pub/sub for `DirectoryEvent` |
//! | [`room_roster`] | `RoomRoster` chat transport seam, `InMemoryRoomRoster` |

pub mod event_bus;
pub mod room_roster;
