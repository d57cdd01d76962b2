use async_trait::async_trait;
use thoughtchain_core::{Message, NodeView, ThoughtchainResult};

/// The classifier's decision for one user turn, after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Open a new child node. `title` is `None` when the classifier did not
    /// supply a usable one; the mutator then derives a title from the
    /// message content.
    Create {
        /// Title for the new node, if the classifier provided one.
        title: Option<String>,
    },
    /// Keep appending to the current node.
    Keep,
}

/// Decides whether a user message should start a new topic node.
///
/// Implementations must tolerate free-form model output and return a
/// normalized [`Verdict`]. A transport or API failure is returned as an
/// error; the tree mutator recovers from it with a local heuristic and
/// never propagates it to the caller.
#[async_trait]
pub trait NodeClassifier: Send + Sync {
    /// Classifies `message` against the current tree snapshot.
    async fn classify(&self, message: &str, tree: &[NodeView]) -> ThoughtchainResult<Verdict>;
}

/// Produces the assistant's reply text for a user turn.
///
/// `history` is the session's prior messages in order, not including
/// `message` itself. A rate/quota failure must surface as
/// [`thoughtchain_core::ThoughtchainError::QuotaExhausted`] so the caller
/// can distinguish it from other failures.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generates a reply to `message` given the conversation so far.
    async fn generate(&self, message: &str, history: &[Message]) -> ThoughtchainResult<String>;
}
