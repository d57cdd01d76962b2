//! Core types and error definitions for Thoughtchain.
//!
//! This crate provides the foundational types shared across all Thoughtchain
//! crates: the conversation-tree entity model (messages, nodes), the flat
//! projection types sent to clients, and the unified error enum.
//!
//! # Main types
//!
//! - [`ThoughtchainError`] — Unified error enum for all subsystems.
//! - [`ThoughtchainResult`] — Convenience alias for `Result<T, ThoughtchainError>`.
//! - [`Role`] — Message author (user or bot).
//! - [`Message`] — A single turn within a session.
//! - [`Node`] — A topic bucket in the conversation tree.
//! - [`NodeView`] / [`MessageView`] — Read-only tree projection for clients.

use serde::{Deserialize, Serialize};

// --- Error types ---

/// Top-level error type for Thoughtchain.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum ThoughtchainError {
    /// An explicitly targeted node id does not exist in the tree.
    #[error("Node {node_id} not found")]
    NodeNotFound {
        /// The id that failed to resolve.
        node_id: usize,
    },

    /// The node-classifier collaborator failed. Recovered locally by the
    /// tree mutator's fallback heuristic; never surfaced to callers.
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// The reply-generation collaborator hit its rate/quota limit (429).
    /// Surfaced distinctly so callers can back off or switch credentials;
    /// the triggering user message is still stored.
    #[error("Generation quota exhausted")]
    QuotaExhausted,

    /// A malformed request from the caller (e.g. empty message content).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An error related to session lookup or lifecycle.
    #[error("Session error: {0}")]
    Session(String),

    /// An error from an outbound HTTP request (e.g. LLM API call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`ThoughtchainError`].
pub type ThoughtchainResult<T> = Result<T, ThoughtchainError>;

// --- Entity model ---

/// Title seeded on the root node of every fresh session.
pub const ROOT_TITLE: &str = "Root Node";

/// The author of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human end-user.
    User,
    /// The AI assistant.
    Bot,
}

/// A single turn within a conversation session.
///
/// Ids are session-scoped, 1-based, and monotonically increasing across the
/// whole session (not per node). A message is immutable once created and is
/// referenced by exactly one [`Node`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Session-global message id (1-based).
    pub id: u64,
    /// The textual content of the message.
    pub content: String,
    /// The author of the message.
    pub role: Role,
}

impl Message {
    /// Creates a new message.
    pub fn new(id: u64, content: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            content: content.into(),
            role,
        }
    }
}

/// A topic bucket in the conversation tree.
///
/// The session owns all nodes in a flat, id-indexed vec; `messages` and
/// `children` hold identifying references into the session's message log
/// and node table. Node ids are dense and 0-based in creation order, so the
/// owning vec doubles as the O(1) lookup table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Session-scoped node id (0-based, creation order).
    pub id: usize,
    /// Topic title shown on the mind-map.
    pub title: String,
    /// Ids of the messages attached to this node, in insertion order.
    pub messages: Vec<u64>,
    /// Ids of this node's direct children, in registration order.
    pub children: Vec<usize>,
}

impl Node {
    /// Creates an empty node with the given id and title.
    pub fn new(id: usize, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            messages: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates the root node (`id` 0, [`ROOT_TITLE`]).
    pub fn root() -> Self {
        Self::new(0, ROOT_TITLE)
    }

    /// True for a freshly seeded root that no message has touched yet:
    /// generic title and no attached messages. The first user message of a
    /// session retitles such a root instead of branching.
    pub fn is_untouched_root(&self) -> bool {
        self.id == 0 && self.title == ROOT_TITLE && self.messages.is_empty()
    }
}

// --- Projection types ---

/// One message inside a [`NodeView`], in the wire shape clients expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    /// Session-global message id.
    #[serde(rename = "messageId")]
    pub message_id: u64,
    /// The author of the message.
    pub role: Role,
    /// The textual content.
    pub content: String,
}

/// One node of the flat tree projection returned by `visualize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    /// The node id.
    #[serde(rename = "nodeId")]
    pub node_id: usize,
    /// The node title.
    pub title: String,
    /// The node's messages, resolved to full content.
    pub messages: Vec<MessageView>,
    /// Ids of the node's direct children.
    #[serde(rename = "childrenIds")]
    pub children_ids: Vec<usize>,
}
