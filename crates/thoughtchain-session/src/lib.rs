//! In-memory session storage for Thoughtchain.
//!
//! A session is an isolated conversation tree plus a global message log,
//! keyed by an opaque caller-supplied id. This crate provides:
//!
//! - [`SessionData`] — the per-session containers and tree primitives.
//! - [`SessionRegistry`] — the store mapping session ids to live sessions,
//!   with last-activity tracking.
//! - [`tree`] — read-only projections (flat visualization, root-to-node
//!   path reconstruction).
//! - [`sweep`] — the periodic expiry sweeper that evicts idle sessions.

/// Per-session containers and tree mutation primitives.
pub mod session;
/// The session registry keyed by opaque id.
pub mod store;
/// Periodic eviction of idle sessions.
pub mod sweep;
/// Read-only tree projections.
pub mod tree;

pub use session::SessionData;
pub use store::{SessionHandle, SessionRegistry};
pub use sweep::{spawn_sweeper, ExpiryConfig};
