//! Type-safe watch identifier.
//!
//! Every arming of an address gets a fresh [`WatchId`] (UUID v4), so a
//! watcher can recognise its own registry entry after the address has been
//! cancelled and re-armed by a newer, independent watch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of one watch generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct WatchId(uuid::Uuid);

impl WatchId {
    /// Creates a new random `WatchId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for WatchId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
