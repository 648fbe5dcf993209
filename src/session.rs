//! Session state broadcasting and live credential validation.

use std::time::Duration;

use reqwest::Method;
use tokio::sync::watch;

use crate::client::http::ApiClient;

/// Authentication state published to the UI layer. `LoggedOut` is the
/// signal to return to the unauthenticated entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    LoggedIn,
    LoggedOut,
}

/// Watch-channel wrapper carrying the current [`AuthState`]. Cloned into
/// the request client so every in-flight call can flip the state; repeated
/// identical updates do not re-notify subscribers.
#[derive(Clone)]
pub struct SessionNotifier {
    tx: watch::Sender<AuthState>,
}

impl SessionNotifier {
    pub fn new() -> (Self, watch::Receiver<AuthState>) {
        let (tx, rx) = watch::channel(AuthState::Unknown);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> AuthState {
        *self.tx.borrow()
    }

    pub fn mark_logged_in(&self) {
        self.set(AuthState::LoggedIn);
    }

    pub fn mark_logged_out(&self) {
        self.set(AuthState::LoggedOut);
    }

    fn set(&self, next: AuthState) {
        self.tx.send_if_modified(|state| {
            if *state != next {
                *state = next;
                true
            } else {
                false
            }
        });
    }
}

/// Pessimistic liveness check for the stored credential. Any ambiguous
/// outcome collapses to "not authenticated" so privileged content is never
/// shown on an uncertain session.
pub struct SessionGuard {
    api: ApiClient,
}

impl SessionGuard {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Probe the identity endpoint with the stored credential, racing a
    /// timeout. Losing the race drops the in-flight request. Every
    /// failure path leaves the credential cleared.
    pub async fn validate(&self, timeout: Duration) -> bool {
        match self.api.store().token() {
            Ok(Some(_)) => {}
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Could not read stored credential: {}", e);
                return false;
            }
        }

        tokio::select! {
            outcome = self.probe() => outcome,
            _ = tokio::time::sleep(timeout) => {
                tracing::info!("Session probe timed out; treating session as invalid");
                self.api.invalidate_session();
                false
            }
        }
    }

    async fn probe(&self) -> bool {
        match self.api.request(Method::GET, "/api/me", &[], None).await {
            // Rejection already cleared the credential
            Ok(None) => false,
            Ok(Some(resp)) if resp.status().is_success() => true,
            Ok(Some(resp)) => {
                tracing::info!("Session probe returned {}; treating as invalid", resp.status());
                self.api.invalidate_session();
                false
            }
            Err(e) => {
                tracing::info!("Session probe failed ({}); treating as invalid", e);
                self.api.invalidate_session();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_notifier_idempotent() {
        let (notifier, mut rx) = SessionNotifier::new();

        notifier.mark_logged_out();
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        // Second invocation converges to the same state without a
        // second notification
        notifier.mark_logged_out();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(notifier.current(), AuthState::LoggedOut);
    }

    #[tokio::test]
    async fn test_validate_no_token_skips_network() {
        // Unroutable address: any network attempt would error, but the
        // guard must return false before trying
        let (_dir, api, _rx) = testutil::test_client("http://127.0.0.1:1");
        let guard = SessionGuard::new(api);
        assert!(!guard.validate(Duration::from_millis(200)).await);
    }

    #[tokio::test]
    async fn test_validate_accepts_live_session() {
        let base = testutil::serve_canned(200, r#"{"id": 7, "name": "ana"}"#).await;
        let (_dir, api, _rx) = testutil::test_client(&base);
        api.store().set_token("tok").unwrap();

        let guard = SessionGuard::new(api);
        assert!(guard.validate(Duration::from_secs(2)).await);
        assert_eq!(guard.api.store().token().unwrap(), Some("tok".to_string()));
    }

    #[tokio::test]
    async fn test_validate_rejection_clears_token() {
        let base = testutil::serve_canned(401, r#"{"error": "bad token"}"#).await;
        let (_dir, api, mut rx) = testutil::test_client(&base);
        api.store().set_token("stale").unwrap();

        let guard = SessionGuard::new(api);
        assert!(!guard.validate(Duration::from_secs(2)).await);
        assert_eq!(guard.api.store().token().unwrap(), None);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::LoggedOut);
    }

    #[tokio::test]
    async fn test_validate_timeout_clears_token() {
        let base = testutil::serve_stalled().await;
        let (_dir, api, _rx) = testutil::test_client(&base);
        api.store().set_token("slow").unwrap();

        let guard = SessionGuard::new(api);
        let start = std::time::Instant::now();
        assert!(!guard.validate(Duration::from_millis(150)).await);
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(guard.api.store().token().unwrap(), None);
    }

    #[tokio::test]
    async fn test_validate_server_error_fails_closed() {
        let base = testutil::serve_canned(500, r#"{"message": "boom"}"#).await;
        let (_dir, api, _rx) = testutil::test_client(&base);
        api.store().set_token("tok").unwrap();

        let guard = SessionGuard::new(api);
        assert!(!guard.validate(Duration::from_secs(2)).await);
        assert_eq!(guard.api.store().token().unwrap(), None);
    }
}
