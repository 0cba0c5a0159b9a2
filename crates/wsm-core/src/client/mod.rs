//! Authenticated request gateway for the workspace API.
//!
//! Every request carries `Authorization: Bearer <access>` and
//! `X-ORG-ID: <active org>` when those session fields are set. A 401 is
//! answered with at most one token refresh followed by one retry.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wsm_core::client::{ApiGateway, RequestOptions};
//! use wsm_core::session::MemoryStorage;
//! use wsm_core::state::AppState;
//!
//! #[tokio::main]
//! async fn main() -> wsm_core::Result<()> {
//!     let state = Arc::new(AppState::load(Arc::new(MemoryStorage::new()))?);
//!     let gateway = ApiGateway::new("http://127.0.0.1:8000", state, Duration::from_secs(30))?;
//!     let response = gateway.request("/api/projects/", RequestOptions::get()).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use crate::state::AppState;
use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Header scoping a request to one organization
pub const ORG_HEADER: &str = "X-ORG-ID";

/// Token refresh endpoint
pub const REFRESH_PATH: &str = "/api/auth/refresh/";

/// Method and optional JSON body of an outbound request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            body: None,
        }
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self> {
        Self::with_body(Method::POST, body)
    }

    pub fn patch<B: Serialize>(body: &B) -> Result<Self> {
        Self::with_body(Method::PATCH, body)
    }

    fn with_body<B: Serialize>(method: Method, body: &B) -> Result<Self> {
        Ok(Self {
            method,
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// Fully read API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Message from a structured error body (`detail` or `error`).
    pub fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        ["detail", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    /// Turn a non-2xx response into an error, using `fallback` when the body
    /// carries no message.
    pub fn into_result(self, fallback: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        if self.is_unauthorized() {
            return Err(Error::SessionExpired);
        }
        let message = self.error_message().unwrap_or_else(|| fallback.to_string());
        Err(Error::api(self.status.as_u16(), message))
    }

    /// Check the status, then decode the body.
    pub fn parse<T: DeserializeOwned>(self, fallback: &str) -> Result<T> {
        self.into_result(fallback)?.json()
    }
}

/// Called after the gateway signs the user out on its own.
pub type SignedOutHook = Arc<dyn Fn() + Send + Sync>;

/// Gateway for the workspace API
#[derive(Clone)]
pub struct ApiGateway {
    /// Base origin, without trailing slash
    base_url: String,
    /// Session and caches; cleared on forced logout
    state: Arc<AppState>,
    /// HTTP client
    client: reqwest::Client,
    /// Run after a forced logout
    on_signed_out: Option<SignedOutHook>,
}

impl ApiGateway {
    /// Create a gateway with its own HTTP client
    pub fn new(base_url: impl Into<String>, state: Arc<AppState>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, state, client))
    }

    /// Create a gateway around an existing HTTP client
    pub fn with_client(base_url: impl Into<String>, state: Arc<AppState>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            state,
            client,
            on_signed_out: None,
        }
    }

    /// Run `hook` whenever a rejected refresh signs the user out.
    pub fn with_signed_out_hook(mut self, hook: SignedOutHook) -> Self {
        self.on_signed_out = Some(hook);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Clear the session and caches, then run the signed-out hook.
    pub(crate) fn force_logout(&self) -> Result<()> {
        self.state.logout()?;
        if let Some(hook) = &self.on_signed_out {
            hook();
        }
        Ok(())
    }

    /// Issue an authenticated request, refreshing the access token and
    /// retrying once on 401.
    ///
    /// Non-2xx responses are returned, not turned into errors; only a request
    /// that never completed is an `Err`.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<ApiResponse> {
        let response = self.send(path, &options).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        if self.state.session().get()?.refresh_token.is_none() {
            debug!("401 on {} with no refresh token", path);
            return Ok(response);
        }

        if self.refresh().await? {
            debug!("Retrying {} {} after refresh", options.method, path);
            return self.send(path, &options).await;
        }

        Ok(response)
    }

    /// Send once with the current session headers.
    async fn send(&self, path: &str, options: &RequestOptions) -> Result<ApiResponse> {
        let session = self.state.session().get()?;
        let url = format!("{}{}", self.base_url, path);
        debug!("API request: {} {}", options.method, url);

        let mut req = self.client.request(options.method.clone(), &url);

        if let Some(ref token) = session.access_token {
            req = req.bearer_auth(token);
        }
        if let Some(ref org_id) = session.active_org_id {
            req = req.header(ORG_HEADER, org_id);
        }
        if let Some(ref body) = options.body {
            req = req.json(body);
        }

        self.read(req).await
    }

    /// Send without credentials and without refresh handling.
    pub(crate) async fn send_anonymous<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        debug!("API request (anonymous): POST {}", url);
        self.read(self.client.post(&url).json(body)).await
    }

    async fn read(&self, req: reqwest::RequestBuilder) -> Result<ApiResponse> {
        let resp = req.send().await.map_err(|e| {
            warn!("HTTP request failed: {}", e);
            Error::Network(e.to_string())
        })?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStorage, SessionKey, SessionStorage};
    use httpmock::prelude::*;
    use serde_json::json;

    fn gateway(server: &MockServer, storage: Arc<MemoryStorage>) -> ApiGateway {
        let state = Arc::new(AppState::load(storage).unwrap());
        ApiGateway::new(server.base_url(), state, Duration::from_secs(5)).unwrap()
    }

    fn signed_in_storage(access: &str, refresh: Option<&str>) -> Arc<MemoryStorage> {
        let mut values = vec![
            (SessionKey::Access, access.to_string()),
            (SessionKey::OrgId, "org-1".to_string()),
        ];
        if let Some(refresh) = refresh {
            values.push((SessionKey::Refresh, refresh.to_string()));
        }
        Arc::new(MemoryStorage::with_values(values))
    }

    #[tokio::test]
    async fn test_request_attaches_auth_and_org_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/projects/")
                    .header("Authorization", "Bearer a1")
                    .header(ORG_HEADER, "org-1");
                then.status(200).json_body(json!([]));
            })
            .await;

        let gateway = gateway(&server, signed_in_storage("a1", None));
        let response = gateway.request("/api/projects/", RequestOptions::get()).await.unwrap();

        assert!(response.is_success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_without_refresh_token_is_returned_unchanged() {
        let server = MockServer::start_async().await;
        let api = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tasks/");
                then.status(401).json_body(json!({ "detail": "Token expired" }));
            })
            .await;
        let refresh = server
            .mock_async(|when, then| {
                when.method(POST).path(REFRESH_PATH);
                then.status(200).json_body(json!({ "access": "a2" }));
            })
            .await;

        let gateway = gateway(&server, signed_in_storage("a1", None));
        let response = gateway.request("/api/tasks/", RequestOptions::get()).await.unwrap();

        assert!(response.is_unauthorized());
        api.assert_hits_async(1).await;
        refresh.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_refresh_success_retries_exactly_once() {
        let server = MockServer::start_async().await;
        let stale = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/tasks/")
                    .header("Authorization", "Bearer a1");
                then.status(401);
            })
            .await;
        let refresh = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(REFRESH_PATH)
                    .json_body(json!({ "refresh": "r1" }));
                then.status(200).json_body(json!({ "access": "a2" }));
            })
            .await;
        let fresh = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/tasks/")
                    .header("Authorization", "Bearer a2");
                then.status(200).json_body(json!([]));
            })
            .await;

        let storage = signed_in_storage("a1", Some("r1"));
        let gateway = gateway(&server, storage.clone());
        let response = gateway.request("/api/tasks/", RequestOptions::get()).await.unwrap();

        assert!(response.is_success());
        stale.assert_hits_async(1).await;
        refresh.assert_hits_async(1).await;
        fresh.assert_hits_async(1).await;

        let session = gateway.state().session().get().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("a2"));
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert_eq!(storage.load(SessionKey::Access).unwrap().as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_not_retried_again() {
        let server = MockServer::start_async().await;
        let api = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tasks/");
                then.status(401);
            })
            .await;
        let refresh = server
            .mock_async(|when, then| {
                when.method(POST).path(REFRESH_PATH);
                then.status(200).json_body(json!({ "access": "a2" }));
            })
            .await;

        let gateway = gateway(&server, signed_in_storage("a1", Some("r1")));
        let response = gateway.request("/api/tasks/", RequestOptions::get()).await.unwrap();

        assert!(response.is_unauthorized());
        api.assert_hits_async(2).await;
        refresh.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_failed_refresh_forces_logout() {
        let server = MockServer::start_async().await;
        let api = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tasks/");
                then.status(401);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(REFRESH_PATH);
                then.status(401).json_body(json!({ "detail": "Token is blacklisted" }));
            })
            .await;
        let anonymous = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/projects/")
                    .header_missing("Authorization")
                    .header_missing(ORG_HEADER);
                then.status(401);
            })
            .await;

        let storage = signed_in_storage("a1", Some("r1"));
        let gateway = gateway(&server, storage.clone());
        let response = gateway.request("/api/tasks/", RequestOptions::get()).await.unwrap();

        assert!(response.is_unauthorized());
        api.assert_hits_async(1).await;
        assert!(storage.is_empty());
        assert!(!gateway.state().session().get().unwrap().is_authenticated());

        gateway.request("/api/projects/", RequestOptions::get()).await.unwrap();
        anonymous.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let state = Arc::new(AppState::load(Arc::new(MemoryStorage::new())).unwrap());
        let gateway = ApiGateway::new("http://127.0.0.1:9", state, Duration::from_secs(2)).unwrap();

        let err = gateway
            .request("/api/projects/", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let response = ApiResponse::new(StatusCode::BAD_REQUEST, r#"{"detail":"Invalid status."}"#);
        let err = response.into_result("Unable to update status.").unwrap_err();
        assert_eq!(err.user_message(), "Invalid status.");
    }

    #[test]
    fn test_error_message_falls_back_per_operation() {
        let response = ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        let err = response.into_result("Unable to delete project.").unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), "Unable to delete project.");
    }
}
