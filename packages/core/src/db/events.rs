//! Domain Events
//!
//! Events broadcast by `NodeService` and `VersionService` after a mutation
//! has been persisted. Subscribers (UI bridges, sync workers, loggers) get a
//! `tokio::sync::broadcast::Receiver` from the service and never touch the
//! store directly.
//!
//! Events are only sent for successful mutations, so a subscriber never sees
//! a change that was rolled back.

use crate::models::{Commit, Node, Patch, Revision};
use serde::{Deserialize, Serialize};

/// Domain events emitted by the services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A new node was created
    NodeCreated(Node),

    /// A node was renamed; `descendants_updated` paths were rewritten with it
    #[serde(rename_all = "camelCase")]
    NodeRenamed {
        node: Node,
        old_path: String,
        descendants_updated: usize,
    },

    /// A node was moved under another parent (or to the root)
    #[serde(rename_all = "camelCase")]
    NodeMoved {
        node: Node,
        old_parent_id: Option<String>,
        old_path: String,
        descendants_updated: usize,
    },

    /// A subtree was deleted
    #[serde(rename_all = "camelCase")]
    NodeDeleted {
        project_id: String,
        id: String,
        removed: usize,
    },

    /// Children of a parent received new `order` values
    #[serde(rename_all = "camelCase")]
    NodesReordered {
        project_id: String,
        parent_id: Option<String>,
        ordered_ids: Vec<String>,
    },

    /// A document advanced to a new version
    VersionCommitted(Revision),

    /// A patch reached a terminal status
    PatchResolved(Patch),

    /// A multi-document commit was recorded
    CommitCreated(Commit),
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NodeCreated(_) => "node:created",
            DomainEvent::NodeRenamed { .. } => "node:renamed",
            DomainEvent::NodeMoved { .. } => "node:moved",
            DomainEvent::NodeDeleted { .. } => "node:deleted",
            DomainEvent::NodesReordered { .. } => "nodes:reordered",
            DomainEvent::VersionCommitted(_) => "version:committed",
            DomainEvent::PatchResolved(_) => "patch:resolved",
            DomainEvent::CommitCreated(_) => "commit:created",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Internally-tagged format: the `type` field sits next to the payload fields
    #[test]
    fn test_event_serialization_contract() {
        let event = DomainEvent::NodeDeleted {
            project_id: "p1".to_string(),
            id: "n1".to_string(),
            removed: 3,
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json.get("type").unwrap(), "nodeDeleted");
        assert_eq!(json.get("projectId").unwrap(), "p1");
        assert_eq!(json.get("removed").unwrap(), 3);
        assert_eq!(event.event_type(), "node:deleted");
    }
}
