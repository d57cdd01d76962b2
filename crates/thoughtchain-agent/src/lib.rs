//! LLM collaborators for Thoughtchain.
//!
//! Two narrow contracts back the conversation tree: a node classifier
//! ("should this user turn open a new topic node, and with what title")
//! and a reply generator. Both are traits so the engine can be tested
//! with stubs; the one real implementation talks to the Google Gemini
//! API over HTTP.
//!
//! LLM output is free-form in practice. [`normalize`] turns whatever came
//! back — strict JSON, synonym keys, booleans, prose — into a stable
//! [`Verdict`], and is a pure function so it can be tested exhaustively
//! without a network.

/// The collaborator traits and the normalized classifier verdict.
pub mod collaborator;
/// Gemini HTTP backend implementing both collaborator traits.
pub mod gemini;
/// Free-form classifier output normalization and fallbacks.
pub mod normalize;

pub use collaborator::{NodeClassifier, ReplyGenerator, Verdict};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use normalize::{fallback_verdict, normalize_verdict, truncate_title};
