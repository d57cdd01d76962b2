//! Turn orchestration for Thoughtchain.
//!
//! [`mutator`] implements `add_message_to_tree` — the placement algorithm
//! that decides which node a message lands in and when a new topic node is
//! opened. [`engine`] wraps it in the operation surface a transport layer
//! consumes: initialize, post a message (optionally chaining an AI reply),
//! visualize, path lookup, and session teardown.

/// The operation surface consumed by a transport layer.
pub mod engine;
/// Message placement and branch creation.
pub mod mutator;

pub use engine::{ChatEngine, InitOutcome, PostMessage, ReplyFailure, TurnOutcome};
pub use mutator::{add_message_to_tree, Placement};
