//! The tree mutator: decides where a message lands and when a new topic
//! node is opened.
//!
//! Locking discipline: the session lock is taken to resolve the target and
//! snapshot the tree, released while the classifier call is in flight, and
//! retaken to apply the placement. Two concurrent turns on the same session
//! can therefore interleave around the classifier call — the accepted
//! single-user-per-session race of this design. The apply step re-resolves
//! the current node so a concurrent reset cannot leave a dangling target.

use thoughtchain_agent::{fallback_verdict, truncate_title, NodeClassifier, Verdict};
use thoughtchain_core::{Role, ThoughtchainError, ThoughtchainResult};
use thoughtchain_session::{tree, SessionData, SessionHandle};
use tracing::{debug, warn};

/// Where a message ended up: its session-global id and the node it was
/// attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// The new message's session-global id (1-based).
    pub message_id: u64,
    /// The node the message was attached to.
    pub node_id: usize,
}

/// Records `content` in the session and places it in the conversation tree.
///
/// `target_node_id` of `None` means "the current node": the last-created
/// node, or a freshly seeded root when the tree is empty. An explicit id
/// that does not resolve aborts the turn with
/// [`ThoughtchainError::NodeNotFound`] before anything is stored.
///
/// Bot messages always land in the resolved node and never branch. User
/// messages consult `classifier`; a classifier failure is recovered with
/// the local fallback heuristic and never escapes this function. The very
/// first user message of a fresh session retitles the root instead of
/// branching (and keeps the generic title when the classifier yields
/// nothing).
pub async fn add_message_to_tree(
    session: &SessionHandle,
    content: &str,
    role: Role,
    target_node_id: Option<usize>,
    classifier: &dyn NodeClassifier,
) -> ThoughtchainResult<Placement> {
    // Resolve and snapshot under the lock; bot messages complete here.
    let (curr_id, first_touch, snapshot) = {
        let mut data = session.lock().await;
        let curr_id = match target_node_id {
            Some(id) => {
                if data.node(id).is_none() {
                    return Err(ThoughtchainError::NodeNotFound { node_id: id });
                }
                id
            }
            None => data.current_node_id(),
        };

        if role == Role::Bot {
            let message_id = data.record_message(content, Role::Bot);
            data.attach_message(curr_id, message_id);
            debug!(node_id = curr_id, message_id, "bot message appended");
            return Ok(Placement {
                message_id,
                node_id: curr_id,
            });
        }

        let first_touch = data
            .node(curr_id)
            .is_some_and(thoughtchain_core::Node::is_untouched_root);
        (curr_id, first_touch, tree::visualize(&data))
    };

    if first_touch {
        // Title-only classification for the very first message: no
        // branching, and a failed or empty answer leaves the generic
        // root title in place permanently.
        let title = match classifier.classify(content, &snapshot).await {
            Ok(Verdict::Create { title }) => title,
            Ok(Verdict::Keep) => None,
            Err(e) => {
                warn!(error = %e, "classifier failed on first message; root keeps generic title");
                None
            }
        };

        let mut data = session.lock().await;
        let node_id = resolve_after_await(&mut data, curr_id);
        if let Some(t) = title {
            if let Some(node) = data.nodes.get_mut(node_id) {
                if node.is_untouched_root() {
                    node.title = t;
                }
            }
        }
        let message_id = data.record_message(content, Role::User);
        data.attach_message(node_id, message_id);
        debug!(node_id, message_id, "first user message placed in root");
        return Ok(Placement {
            message_id,
            node_id,
        });
    }

    let verdict = classifier
        .classify(content, &snapshot)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "classifier failed; applying fallback heuristic");
            fallback_verdict(content)
        });

    let mut data = session.lock().await;
    let curr_id = resolve_after_await(&mut data, curr_id);
    let message_id = data.record_message(content, Role::User);
    let node_id = match verdict {
        Verdict::Keep => curr_id,
        Verdict::Create { title } => {
            let title = title.unwrap_or_else(|| truncate_title(content));
            let id = data.create_node(title, curr_id);
            debug!(node_id = id, parent = curr_id, "new topic node created");
            id
        }
    };
    data.attach_message(node_id, message_id);
    Ok(Placement {
        message_id,
        node_id,
    })
}

/// The snapshot target may have vanished while the classifier call was in
/// flight (concurrent reset). Fall back to the current node in that case.
fn resolve_after_await(data: &mut SessionData, curr_id: usize) -> usize {
    if data.node(curr_id).is_some() {
        curr_id
    } else {
        data.current_node_id()
    }
}
