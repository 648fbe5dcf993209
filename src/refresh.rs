//! Sequencing for overlapping group refetches.
//!
//! A focus-triggered reload can still be in flight when a post-settlement
//! refetch lands. Responses are admitted by issue order, not completion
//! order: a fetch that started before a newer one began is discarded
//! instead of overwriting fresher data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::client::http::ApiClient;
use crate::client::types::Group;
use crate::error::SplitmateError;

/// Monotonic ticket source. Only the most recently issued ticket is
/// admitted.
#[derive(Default)]
pub struct RefreshGate {
    issued: AtomicU64,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn admit(&self, ticket: u64) -> bool {
        ticket == self.issued.load(Ordering::SeqCst)
    }
}

/// Read-through view of one group. Every `refresh` replaces the snapshot
/// wholesale when admitted; stale completions leave it untouched.
pub struct GroupFeed {
    api: ApiClient,
    group_id: i64,
    gate: RefreshGate,
    latest: Mutex<Option<Group>>,
}

impl GroupFeed {
    pub fn new(api: ApiClient, group_id: i64) -> Self {
        Self {
            api,
            group_id,
            gate: RefreshGate::new(),
            latest: Mutex::new(None),
        }
    }

    /// Fetch the group and apply the result if no newer refresh has begun
    /// meanwhile. Returns the current snapshot, or `None` when the
    /// session was invalidated mid-fetch.
    pub async fn refresh(&self) -> Result<Option<Group>, SplitmateError> {
        let ticket = self.gate.begin();
        let Some(group) = self.api.group(self.group_id).await? else {
            return Ok(None);
        };
        self.apply(ticket, group);
        Ok(self.current())
    }

    pub fn current(&self) -> Option<Group> {
        self.latest.lock().expect("group snapshot lock poisoned").clone()
    }

    fn apply(&self, ticket: u64, group: Group) -> bool {
        let mut latest = self.latest.lock().expect("group snapshot lock poisoned");
        if self.gate.admit(ticket) {
            *latest = Some(group);
            true
        } else {
            tracing::debug!("Discarding stale fetch for group {}", self.group_id);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn group(id: i64, name: &str) -> Group {
        serde_json::from_value(serde_json::json!({ "id": id, "name": name })).unwrap()
    }

    #[test]
    fn test_gate_admits_only_newest() {
        let gate = RefreshGate::new();
        let first = gate.begin();
        assert!(gate.admit(first));

        let second = gate.begin();
        assert!(!gate.admit(first));
        assert!(gate.admit(second));
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let base = testutil::serve_canned(200, r#"{"id": 1, "name": "unused"}"#).await;
        let (_dir, api, _rx) = testutil::test_client(&base);
        let feed = GroupFeed::new(api, 1);

        // Older fetch starts first but completes last
        let stale_ticket = feed.gate.begin();
        let fresh_ticket = feed.gate.begin();

        assert!(feed.apply(fresh_ticket, group(1, "after settlement")));
        assert!(!feed.apply(stale_ticket, group(1, "before settlement")));

        assert_eq!(feed.current().unwrap().name, "after settlement");
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let base = testutil::serve_canned(200, r#"{"id": 4, "name": "Ski trip"}"#).await;
        let (_dir, api, _rx) = testutil::test_client(&base);
        api.store().set_token("tok").unwrap();

        let feed = GroupFeed::new(api, 4);
        let snapshot = feed.refresh().await.unwrap().unwrap();
        assert_eq!(snapshot.name, "Ski trip");
        assert_eq!(feed.current().unwrap().id, 4);
    }

    #[tokio::test]
    async fn test_refresh_on_invalid_session_yields_none() {
        let base = testutil::serve_canned(401, r#"{"error": "expired"}"#).await;
        let (_dir, api, _rx) = testutil::test_client(&base);
        api.store().set_token("expired").unwrap();

        let feed = GroupFeed::new(api, 4);
        assert!(feed.refresh().await.unwrap().is_none());
        assert!(feed.current().is_none());
    }
}
