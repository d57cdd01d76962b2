use serde::{Deserialize, Serialize};
use thoughtchain_core::{Message, Node, Role};

/// The per-session containers: the global message log and the node table.
///
/// Both live for exactly as long as the session. Node ids are dense and
/// 0-based so `nodes` doubles as the id-indexed lookup table; message ids
/// are 1-based positions in `messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    /// Session-global message log, in creation order. `messages[i].id == i + 1`.
    pub messages: Vec<Message>,
    /// All nodes of the tree, in creation order. `nodes[i].id == i`.
    pub nodes: Vec<Node>,
}

impl SessionData {
    /// Creates an empty session with no nodes and no messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears messages and nodes in place. The containers keep their
    /// identity, so any handle held elsewhere observes the wipe.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.nodes.clear();
    }

    /// [`reset`](Self::reset) followed by seeding `Node(0, "Root Node")`.
    pub fn reset_with_root(&mut self) {
        self.reset();
        self.nodes.push(Node::root());
    }

    /// Looks up a node by id.
    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The id of the last-created node, seeding the root first when the
    /// tree is empty. This is what an absent target id resolves to.
    pub fn current_node_id(&mut self) -> usize {
        if self.nodes.is_empty() {
            self.nodes.push(Node::root());
        }
        self.nodes.len() - 1
    }

    /// Appends a message to the global log and returns its id.
    ///
    /// Ids are allocated as `messages.len() + 1`, so they are 1-based and
    /// monotonically increasing for the lifetime of the session.
    pub fn record_message(&mut self, content: impl Into<String>, role: Role) -> u64 {
        let id = self.messages.len() as u64 + 1;
        self.messages.push(Message::new(id, content, role));
        id
    }

    /// Attaches an already-recorded message to a node.
    pub fn attach_message(&mut self, node_id: usize, message_id: u64) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.messages.push(message_id);
        }
    }

    /// Creates a new node with id `nodes.len()` and registers it as a child
    /// of `parent`. The root (id 0) has no parent to attach to.
    ///
    /// Returns the new node's id.
    pub fn create_node(&mut self, title: impl Into<String>, parent: usize) -> usize {
        let id = self.nodes.len();
        if id > 0 {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.push(id);
            }
        }
        self.nodes.push(Node::new(id, title));
        id
    }
}
