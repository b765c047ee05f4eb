//! Lifecycle events published for downstream consumers.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::media::{MediaId, MediaStatus};

/// A media lifecycle transition.
///
/// Delivery is at-least-once; consumers (content catalog, notification
/// system) must be idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleEvent {
    /// The media item that transitioned
    pub media_id: MediaId,
    /// Status before the transition
    pub old_status: MediaStatus,
    /// Status after the transition
    pub new_status: MediaStatus,
    /// When the transition was applied
    pub at: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Record a transition happening now.
    pub fn now(media_id: MediaId, old_status: MediaStatus, new_status: MediaStatus) -> Self {
        Self {
            media_id,
            old_status,
            new_status,
            at: Utc::now(),
        }
    }
}
