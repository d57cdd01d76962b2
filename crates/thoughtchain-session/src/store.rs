use crate::session::SessionData;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A shared handle to one session's containers.
///
/// The outer `Arc` lets the registry and in-flight turns reference the same
/// data; the `tokio::sync::Mutex` is held only while reading or mutating the
/// containers, never across a collaborator call.
pub type SessionHandle = Arc<tokio::sync::Mutex<SessionData>>;

struct Entry {
    data: SessionHandle,
    last_activity: DateTime<Utc>,
}

/// In-memory store of all live sessions, keyed by opaque session id.
///
/// Ids are caller-supplied arbitrary strings; the registry makes no format
/// assumptions (they need not be UUIDs). Every access, read or write,
/// refreshes the session's `last_activity` stamp, which the expiry sweeper
/// uses to evict idle sessions.
///
/// The registry map itself is guarded by a synchronous [`parking_lot::Mutex`]
/// that is never held across an `.await`; callers clone the [`SessionHandle`]
/// out and lock it independently.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionRegistry {
    /// Creates an empty registry. Multiple independent registries can
    /// coexist; there is no global instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `session_id`, allocating an empty session on
    /// first access, and stamps `last_activity = now`.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id = %session_id, "allocating new session");
                Entry {
                    data: Arc::new(tokio::sync::Mutex::new(SessionData::new())),
                    last_activity: Utc::now(),
                }
            });
        entry.last_activity = Utc::now();
        Arc::clone(&entry.data)
    }

    /// Clears the session's messages and nodes in place, creating the
    /// session first if it does not exist. Handles held elsewhere observe
    /// the wipe.
    pub async fn reset(&self, session_id: &str) {
        let handle = self.get_or_create(session_id);
        handle.lock().await.reset();
    }

    /// [`reset`](Self::reset), then seed the root node `Node(0, "Root Node")`.
    pub async fn reset_with_root(&self, session_id: &str) {
        let handle = self.get_or_create(session_id);
        handle.lock().await.reset_with_root();
    }

    /// Removes the session entirely. Returns `true` if it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.lock().remove(session_id).is_some()
    }

    /// Evicts every session whose `last_activity` is older than `retention`.
    /// Returns the number of sessions removed.
    ///
    /// Advisory only: a session accessed right at the boundary may be
    /// evicted and silently recreated empty on its next access. The store
    /// has no durability guarantee, so this is accepted behavior, not a
    /// correctness bug. Whole sessions only; a live session is never
    /// partially mutated.
    pub fn evict_idle(&self, retention: Duration) -> usize {
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let Some(cutoff) = Utc::now().checked_sub_signed(retention) else {
            // Retention window larger than representable time: nothing can be stale.
            return 0;
        };
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.last_activity >= cutoff;
            if !keep {
                debug!(session_id = %id, last_activity = %entry.last_activity, "evicting idle session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// True when no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, session_id: &str, age: Duration) {
        if let Some(entry) = self.sessions.lock().get_mut(session_id) {
            let age = chrono::Duration::from_std(age).unwrap_or(chrono::Duration::zero());
            entry.last_activity = Utc::now() - age;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use thoughtchain_core::Role;

    #[tokio::test]
    async fn get_or_create_returns_same_session() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_create("s1");
        a.lock().await.record_message("hello", Role::User);

        let b = registry.get_or_create("s1");
        assert_eq!(b.lock().await.messages.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let registry = SessionRegistry::new();
        registry.reset_with_root("s1").await;
        registry.reset_with_root("s2").await;

        let s1 = registry.get_or_create("s1");
        s1.lock().await.record_message("only in s1", Role::User);

        let s2 = registry.get_or_create("s2");
        assert!(s2.lock().await.messages.is_empty());
    }

    #[tokio::test]
    async fn reset_is_visible_through_held_handles() {
        let registry = SessionRegistry::new();
        let held = registry.get_or_create("s1");
        held.lock().await.record_message("wiped soon", Role::User);

        registry.reset("s1").await;
        assert!(held.lock().await.messages.is_empty());
    }

    #[tokio::test]
    async fn reset_with_root_seeds_node_zero() {
        let registry = SessionRegistry::new();
        registry.reset_with_root("s1").await;
        let handle = registry.get_or_create("s1");
        let data = handle.lock().await;
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].id, 0);
        assert_eq!(data.nodes[0].title, thoughtchain_core::ROOT_TITLE);
    }

    #[test]
    fn remove_reports_existence() {
        let registry = SessionRegistry::new();
        registry.get_or_create("s1");
        assert!(registry.remove("s1"));
        assert!(!registry.remove("s1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn non_uuid_session_ids_are_accepted_verbatim() {
        let registry = SessionRegistry::new();
        registry.get_or_create("definitely not a uuid / with spaces");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn evict_idle_removes_only_stale_sessions() {
        let registry = SessionRegistry::new();
        registry.get_or_create("fresh");
        registry.get_or_create("stale");
        registry.backdate("stale", Duration::from_secs(25 * 3600));

        let evicted = registry.evict_idle(Duration::from_secs(24 * 3600));
        assert_eq!(evicted, 1);
        assert_eq!(registry.len(), 1);

        // The evicted session comes back empty on next access.
        let handle = registry.get_or_create("stale");
        assert!(handle.try_lock().unwrap().nodes.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn access_refreshes_last_activity() {
        let registry = SessionRegistry::new();
        registry.get_or_create("s1");
        registry.backdate("s1", Duration::from_secs(25 * 3600));

        // A read access rescues the session from the next sweep.
        registry.get_or_create("s1");
        let evicted = registry.evict_idle(Duration::from_secs(24 * 3600));
        assert_eq!(evicted, 0);
    }
}
