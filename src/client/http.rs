//! Authenticated HTTP client for the ledger API.
//!
//! Every privileged call goes through [`ApiClient::request`], which reads
//! the stored credential, attaches a normalized bearer header, and reacts
//! uniformly to rejection: statuses 400 and 401 clear the credential,
//! publish `LoggedOut`, and surface as `Ok(None)` so callers never
//! interpret a rejected response body. Transport failures are not auth
//! failures and propagate as errors.

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::client::error_body::extract_error_message;
use crate::client::types::{
    AuthResponse, Credentials, DashboardSummary, Group, NewGroup, NewUser, Settlement, User,
};
use crate::error::SplitmateError;
use crate::session::SessionNotifier;
use crate::store::CredentialStore;

/// Statuses the server uses to reject a presented credential. Both are
/// treated identically.
pub fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED
}

fn strip_bearer_prefix(s: &str) -> Option<&str> {
    if s.len() >= 6 && s.is_char_boundary(6) && s[..6].eq_ignore_ascii_case("bearer") {
        let rest = &s[6..];
        if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
            return Some(rest.trim_start());
        }
    }
    None
}

/// Build an `Authorization` value from a raw stored token: strip stray
/// quotes and whitespace, collapse any existing `Bearer ` prefixes, then
/// re-add exactly one. Returns `None` when nothing usable remains.
pub fn bearer_header(raw: &str) -> Option<String> {
    let mut token = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    while let Some(rest) = strip_bearer_prefix(token) {
        token = rest.trim_matches(|c| c == '"' || c == '\'').trim();
    }
    if token.is_empty() {
        None
    } else {
        Some(format!("Bearer {}", token))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
    notifier: SessionNotifier,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        request_timeout: Duration,
        store: Arc<CredentialStore>,
        notifier: SessionNotifier,
    ) -> Result<Self, SplitmateError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            notifier,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn notifier(&self) -> &SessionNotifier {
        &self.notifier
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Clear the credential and publish `LoggedOut`. Safe to invoke
    /// repeatedly and from concurrent in-flight requests.
    pub fn invalidate_session(&self) {
        if let Err(e) = self.store.clear_token() {
            tracing::warn!("Could not clear stored credential: {}", e);
        }
        self.notifier.mark_logged_out();
    }

    /// Send an authenticated request. `Ok(None)` means the request was
    /// not completed on the caller's behalf (absent credential or auth
    /// rejection) and the session-invalid side effect already ran; the
    /// caller must not interpret it as data. Content-type and
    /// authorization always win over `extra_headers`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        extra_headers: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<Option<Response>, SplitmateError> {
        let header = match self.store.token()? {
            Some(raw) => bearer_header(&raw),
            None => None,
        };
        let Some(authorization) = header else {
            tracing::info!("No stored credential for {} {}; session invalid", method, path);
            self.invalidate_session();
            return Ok(None);
        };

        let mut req = self.http.request(method, self.url(path));
        for (name, value) in extra_headers {
            req = req.header(*name, *value);
        }
        req = req
            .header("Content-Type", "application/json")
            .header("Authorization", authorization);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await?;
        if is_auth_rejection(resp.status()) {
            tracing::info!("{} rejected with {}; session invalid", path, resp.status());
            self.invalidate_session();
            return Ok(None);
        }
        Ok(Some(resp))
    }

    // --- Auth flows (no bearer header) ---

    pub async fn login(&self, credentials: &Credentials) -> Result<Option<User>, SplitmateError> {
        self.authenticate("/login", json!({ "user": credentials })).await
    }

    pub async fn signup(&self, new_user: &NewUser) -> Result<Option<User>, SplitmateError> {
        self.authenticate("/signup", json!({ "user": new_user })).await
    }

    async fn authenticate(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Option<User>, SplitmateError> {
        let resp = self
            .http
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        let auth: AuthResponse = Self::into_typed(resp).await?;
        let token = auth
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(SplitmateError::MissingToken)?;
        self.store.set_token(&token)?;
        self.notifier.mark_logged_in();
        Ok(auth.user)
    }

    /// Revoke the credential server-side, then clean up locally no matter
    /// what the server said.
    pub async fn logout(&self) {
        if let Ok(Some(raw)) = self.store.token() {
            if let Some(authorization) = bearer_header(&raw) {
                let result = self
                    .http
                    .delete(self.url("/logout"))
                    .header("Authorization", authorization)
                    .send()
                    .await;
                if let Err(e) = result {
                    tracing::debug!("Remote logout failed, continuing locally: {}", e);
                }
            }
        }
        self.invalidate_session();
    }

    // --- Authenticated endpoints ---

    pub async fn me(&self) -> Result<Option<User>, SplitmateError> {
        self.get_json("/api/me").await
    }

    pub async fn groups(&self) -> Result<Option<Vec<Group>>, SplitmateError> {
        self.get_json("/api/groups").await
    }

    pub async fn group(&self, id: i64) -> Result<Option<Group>, SplitmateError> {
        self.get_json(&format!("/api/groups/{}", id)).await
    }

    pub async fn dashboard(&self) -> Result<Option<DashboardSummary>, SplitmateError> {
        self.get_json("/api/dashboard").await
    }

    pub async fn create_group(&self, group: &NewGroup) -> Result<Option<Group>, SplitmateError> {
        if group.name.trim().is_empty() {
            return Err(SplitmateError::Validation("Group name is required".to_string()));
        }
        if group.member_ids.is_empty() {
            return Err(SplitmateError::Validation(
                "A group needs at least one member".to_string(),
            ));
        }
        self.post_json("/api/groups", json!({ "group": group })).await
    }

    pub async fn create_settlement(
        &self,
        group_id: i64,
        settlement: &Settlement,
    ) -> Result<Option<serde_json::Value>, SplitmateError> {
        self.post_json(
            &format!("/api/groups/{}/settlements", group_id),
            json!({ "settlement": settlement }),
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SplitmateError> {
        let Some(resp) = self.request(Method::GET, path, &[], None).await? else {
            return Ok(None);
        };
        Ok(Some(Self::into_typed(resp).await?))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Option<T>, SplitmateError> {
        let Some(resp) = self.request(Method::POST, path, &[], Some(body)).await? else {
            return Ok(None);
        };
        Ok(Some(Self::into_typed(resp).await?))
    }

    async fn into_typed<T: DeserializeOwned>(resp: Response) -> Result<T, SplitmateError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            let body = resp.bytes().await.unwrap_or_default();
            Err(SplitmateError::Server {
                status: status.as_u16(),
                message: extract_error_message(status, &body),
            })
        }
    }
}
