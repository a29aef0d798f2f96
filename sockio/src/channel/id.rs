//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Channel identifier types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier of a [`Channel`](super::Channel).
///
/// Ids are allocated from a global counter and never reused, so they are
/// safe to use as keys in a server's table of live channels. The id also
/// serves as the Engine.IO session id announced in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

impl ChannelId {
    /// Allocates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the session id string sent in the open handshake.
    #[must_use]
    pub fn session_id(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for ChannelId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_uniqueness() {
        let id1 = ChannelId::new();
        let id2 = ChannelId::new();

        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn test_channel_id_display() {
        let id = ChannelId::from(42);
        assert_eq!(format!("{}", id), "Channel(42)");
        assert_eq!(id.session_id(), "000000000000002a");
    }
}
