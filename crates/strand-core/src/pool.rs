// crates/strand-core/src/pool.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{ContentHash, NodeId};

/// A replica group for one piece of content.
///
/// Pools are immutable snapshots. They hold NodeId keys only; trust and
/// addresses are always resolved through the registry, so a member that has
/// since been evicted simply resolves to "currently unverified".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: Uuid,
    pub hash: ContentHash,
    pub members: Vec<NodeId>,
    pub created_at: DateTime<Utc>,
    /// When membership was last recomputed from the registry.
    pub refreshed_at: DateTime<Utc>,
}

impl Pool {
    /// Build a new pool snapshot with a fresh UUID v7.
    pub fn new(hash: ContentHash, members: Vec<NodeId>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            hash,
            members,
            created_at: now,
            refreshed_at: now,
        }
    }

    /// Same pool identity with recomputed membership.
    pub fn with_members(&self, members: Vec<NodeId>, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            hash: self.hash,
            members,
            created_at: self.created_at,
            refreshed_at: now,
        }
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.members.contains(node)
    }
}
