//! Read-only projections over a session's conversation tree.
//!
//! Everything here is pure: no mutation, no locking, no I/O. The flat
//! visualization is what gets serialized to clients; the parent map and
//! path assembly are kept separate so each is independently testable.

use crate::session::SessionData;
use std::collections::HashMap;
use thoughtchain_core::{MessageView, NodeView, ThoughtchainError, ThoughtchainResult};

/// Projects the tree as a flat list over `nodes` in creation order.
///
/// Each entry carries the node's messages resolved to full content and the
/// ids of its direct children in registration order. Idempotent: two calls
/// without an intervening mutation return identical output.
pub fn visualize(data: &SessionData) -> Vec<NodeView> {
    data.nodes
        .iter()
        .map(|node| NodeView {
            node_id: node.id,
            title: node.title.clone(),
            messages: node
                .messages
                .iter()
                .filter_map(|&mid| {
                    // Message ids are 1-based positions in the global log.
                    (mid as usize).checked_sub(1).and_then(|i| data.messages.get(i))
                })
                .map(|msg| MessageView {
                    message_id: msg.id,
                    role: msg.role,
                    content: msg.content.clone(),
                })
                .collect(),
            children_ids: node.children.clone(),
        })
        .collect()
}

/// Builds the child → parent id map with one depth-first walk over
/// `children`, starting at the root. The root has no entry.
pub fn parent_map(data: &SessionData) -> HashMap<usize, usize> {
    let mut parents = HashMap::new();
    if data.nodes.is_empty() {
        return parents;
    }
    let mut stack = vec![0usize];
    while let Some(id) = stack.pop() {
        if let Some(node) = data.node(id) {
            for &child in &node.children {
                parents.insert(child, id);
                stack.push(child);
            }
        }
    }
    parents
}

/// Reconstructs the root-to-target path as a sequence of node ids.
///
/// Climbs the parent map from `target` up to the node with no parent entry,
/// prepending at each step. A single-node tree yields a one-element path.
/// Returns [`ThoughtchainError::NodeNotFound`] when `target` is not in the
/// tree.
pub fn path_to(data: &SessionData, target: usize) -> ThoughtchainResult<Vec<usize>> {
    if data.node(target).is_none() {
        return Err(ThoughtchainError::NodeNotFound { node_id: target });
    }
    let parents = parent_map(data);
    let mut path = vec![target];
    let mut current = target;
    while let Some(&parent) = parents.get(&current) {
        path.insert(0, parent);
        current = parent;
    }
    Ok(path)
}
