use crate::mutator::add_message_to_tree;
use serde::Serialize;
use std::sync::Arc;
use thoughtchain_agent::{NodeClassifier, ReplyGenerator};
use thoughtchain_core::{
    Message, NodeView, Role, ThoughtchainError, ThoughtchainResult,
};
use thoughtchain_session::{tree, SessionRegistry};
use tracing::{info, warn};
use uuid::Uuid;

/// A message-append request from the transport layer.
#[derive(Debug, Clone)]
pub struct PostMessage {
    /// Caller-held session id; `None` generates a fresh one.
    pub session_id: Option<String>,
    /// Message text. Must be non-empty.
    pub content: String,
    /// Author of the message.
    pub role: Role,
    /// Explicit target node; `None` means the current node. (Transports
    /// that encode "current" as `-1` map it to `None` before calling.)
    pub node_id: Option<usize>,
    /// Whether to chain an AI-generated reply after a user message.
    pub want_reply: bool,
}

/// Why a requested reply was not delivered. The triggering user message is
/// stored either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplyFailure {
    /// The generation collaborator is out of quota (HTTP 429-class).
    /// Callers should prompt for alternate credentials or back off.
    QuotaExhausted,
    /// Any other generation failure.
    Other(String),
}

/// Result of a [`ChatEngine::post_message`] turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// The resolved session id, echoed so the caller can persist it.
    pub session_id: String,
    /// Session-global id of the stored message.
    pub message_id: u64,
    /// The node the message landed in.
    pub node_id: usize,
    /// The AI reply, when one was requested and stored.
    pub reply: Option<String>,
    /// Set when a requested reply could not be produced.
    pub reply_error: Option<ReplyFailure>,
    /// Full tree visualization after the turn.
    pub tree: Vec<NodeView>,
}

/// Result of [`ChatEngine::initialize`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOutcome {
    /// The resolved session id, echoed so the caller can persist it.
    pub session_id: String,
    /// Always 0: the freshly seeded root.
    pub root_node_id: usize,
    /// Tree visualization (the lone root node).
    pub tree: Vec<NodeView>,
}

/// The operation surface a transport layer consumes.
///
/// Wires the session registry to the two LLM collaborators and chains the
/// two mutator calls of a full user turn (store the user message, then
/// store the generated reply in the same node).
pub struct ChatEngine {
    registry: Arc<SessionRegistry>,
    classifier: Arc<dyn NodeClassifier>,
    generator: Arc<dyn ReplyGenerator>,
}

impl ChatEngine {
    /// Creates an engine over the given registry and collaborators.
    pub fn new(
        registry: Arc<SessionRegistry>,
        classifier: Arc<dyn NodeClassifier>,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            registry,
            classifier,
            generator,
        }
    }

    /// The underlying registry (e.g. for spawning the expiry sweeper).
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Uses the supplied id verbatim (ids are opaque, not validated) or
    /// generates a fresh UUIDv4 string when absent.
    fn resolve_session_id(supplied: Option<String>) -> String {
        supplied
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Resets the session and seeds its root node.
    pub async fn initialize(&self, session_id: Option<String>) -> InitOutcome {
        let session_id = Self::resolve_session_id(session_id);
        self.registry.reset_with_root(&session_id).await;
        info!(session_id = %session_id, "session initialized with root node");
        let tree = self.visualize(&session_id).await;
        InitOutcome {
            session_id,
            root_node_id: 0,
            tree,
        }
    }

    /// Stores a message in the tree; for user messages with `want_reply`,
    /// generates an AI reply over the session history and stores it in the
    /// node the user message landed in.
    pub async fn post_message(&self, req: PostMessage) -> ThoughtchainResult<TurnOutcome> {
        if req.content.is_empty() {
            return Err(ThoughtchainError::InvalidRequest(
                "message content must not be empty".into(),
            ));
        }

        let session_id = Self::resolve_session_id(req.session_id);
        let handle = self.registry.get_or_create(&session_id);

        let placement = add_message_to_tree(
            &handle,
            &req.content,
            req.role,
            req.node_id,
            self.classifier.as_ref(),
        )
        .await?;

        let mut reply = None;
        let mut reply_error = None;
        if req.want_reply && req.role == Role::User {
            // History up to (not including) the message just stored.
            let history: Vec<Message> = {
                let data = handle.lock().await;
                let upto = data.messages.len().saturating_sub(1);
                data.messages[..upto].to_vec()
            };

            match self.generator.generate(&req.content, &history).await {
                Ok(text) => {
                    // The reply lands in the same node as its user message.
                    match add_message_to_tree(
                        &handle,
                        &text,
                        Role::Bot,
                        Some(placement.node_id),
                        self.classifier.as_ref(),
                    )
                    .await
                    {
                        Ok(_) => reply = Some(text),
                        Err(e) => {
                            warn!(session_id = %session_id, error = %e, "failed to store reply");
                            reply_error = Some(ReplyFailure::Other(e.to_string()));
                        }
                    }
                }
                Err(ThoughtchainError::QuotaExhausted) => {
                    warn!(session_id = %session_id, "reply generation quota exhausted");
                    reply_error = Some(ReplyFailure::QuotaExhausted);
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "reply generation failed");
                    reply_error = Some(ReplyFailure::Other(e.to_string()));
                }
            }
        }

        let tree = {
            let data = handle.lock().await;
            tree::visualize(&data)
        };

        Ok(TurnOutcome {
            session_id,
            message_id: placement.message_id,
            node_id: placement.node_id,
            reply,
            reply_error,
            tree,
        })
    }

    /// The flat tree projection for a session. An unknown id yields an
    /// empty (freshly created) session rather than an error.
    pub async fn visualize(&self, session_id: &str) -> Vec<NodeView> {
        let handle = self.registry.get_or_create(session_id);
        let data = handle.lock().await;
        tree::visualize(&data)
    }

    /// The root-to-node path for `node_id`, as resolved node views.
    pub async fn path_to(
        &self,
        session_id: &str,
        node_id: usize,
    ) -> ThoughtchainResult<Vec<NodeView>> {
        let handle = self.registry.get_or_create(session_id);
        let data = handle.lock().await;
        let path = tree::path_to(&data, node_id)?;
        let views = tree::visualize(&data);
        // Node ids are dense creation-order indices, so the visualization
        // vec is indexable by id.
        Ok(path
            .into_iter()
            .filter_map(|id| views.get(id).cloned())
            .collect())
    }

    /// Clears the session's messages and nodes without seeding a root.
    pub async fn clear(&self, session_id: &str) {
        self.registry.reset(session_id).await;
        info!(session_id = %session_id, "session cleared");
    }

    /// Removes the session entirely. Returns `true` if it existed.
    pub fn delete(&self, session_id: &str) -> bool {
        let existed = self.registry.remove(session_id);
        if existed {
            info!(session_id = %session_id, "session deleted");
        }
        existed
    }
}
