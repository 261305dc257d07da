// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Chat rooms an agent occupies once it has joined a community path.

use aegis_directory::domain::CommunityPath;

/// Rooms for `path`: a `<segment>_down@<domain>` room for every segment,
/// root first, then the leaf's own `<leaf>@<domain>` room.
///
/// ```
/// use aegis_directory::domain::CommunityPath;
/// use aegis_directory_sdk::room_jids;
///
/// let path = CommunityPath::parse("peak/a0").unwrap();
/// assert_eq!(
///     room_jids(&path, "localhost"),
///     vec!["peak_down@localhost", "a0_down@localhost", "a0@localhost"]
/// );
/// ```
pub fn room_jids(path: &CommunityPath, domain: &str) -> Vec<String> {
    path.segments()
        .iter()
        .map(|segment| format!("{}_down@{}", segment, domain))
        .chain(std::iter::once(format!("{}@{}", path.leaf(), domain)))
        .collect()
}
