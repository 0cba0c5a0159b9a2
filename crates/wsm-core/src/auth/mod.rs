//! Authentication flows.
//!
//! - Login and registration exchange credentials for a token pair
//! - Refresh swaps the refresh token for a new access token
//!
//! None of these go through the gateway's refresh-retry path.

use crate::client::{ApiGateway, ApiResponse, REFRESH_PATH};
use crate::error::{Error, Result};
use crate::session::SessionPatch;
use crate::types::{Credentials, RefreshRequest, RefreshResponse, TokenPair};
use tracing::{info, warn};

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const REGISTER_PATH: &str = "/api/auth/register/";

const LOGIN_FAILED: &str = "Login failed. Check credentials.";
const REGISTER_FAILED: &str = "Registration failed. Try a stronger password.";

impl ApiGateway {
    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `false` and signs out when the API rejects the refresh token.
    /// The refresh token itself is kept as-is on success.
    pub async fn refresh(&self) -> Result<bool> {
        let Some(refresh) = self.state().session().get()?.refresh_token else {
            return Ok(false);
        };

        let response = self
            .send_anonymous(REFRESH_PATH, &RefreshRequest { refresh: &refresh })
            .await?;

        if !response.is_success() {
            warn!("Token refresh rejected ({}), signing out", response.status());
            self.force_logout()?;
            return Ok(false);
        }

        match response.json::<RefreshResponse>() {
            Ok(body) => {
                self.state().session().set(SessionPatch::access(body.access))?;
                info!("Access token refreshed");
                Ok(true)
            }
            Err(e) => {
                warn!("Malformed refresh response: {}", e);
                self.force_logout()?;
                Ok(false)
            }
        }
    }

    /// Sign in and store both tokens.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let response = self.send_anonymous(LOGIN_PATH, credentials).await?;
        self.store_tokens(token_pair(response, LOGIN_FAILED)?)?;
        info!("Signed in as {}", credentials.email);
        Ok(())
    }

    /// Create an account and store both tokens.
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        let response = self.send_anonymous(REGISTER_PATH, credentials).await?;
        self.store_tokens(token_pair(response, REGISTER_FAILED)?)?;
        info!("Registered {}", credentials.email);
        Ok(())
    }

    fn store_tokens(&self, tokens: TokenPair) -> Result<()> {
        self.state().session().set(SessionPatch::tokens(tokens))
    }
}

/// Any failure of an auth exchange maps to one fixed message.
fn token_pair(response: ApiResponse, message: &str) -> Result<TokenPair> {
    if !response.is_success() {
        return Err(Error::api(response.status().as_u16(), message));
    }
    response.json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStorage, SessionKey, SessionStorage};
    use crate::state::AppState;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn gateway(server: &MockServer, storage: Arc<MemoryStorage>) -> ApiGateway {
        let state = Arc::new(AppState::load(storage).unwrap());
        ApiGateway::new(server.base_url(), state, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_login_stores_tokens() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(LOGIN_PATH)
                    .header_missing("Authorization")
                    .json_body(json!({ "email": "owner@example.com", "password": "pw" }));
                then.status(200).json_body(json!({ "access": "a1", "refresh": "r1" }));
            })
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let gateway = gateway(&server, storage.clone());
        gateway
            .login(&Credentials {
                email: "owner@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        assert_eq!(storage.load(SessionKey::Access).unwrap().as_deref(), Some("a1"));
        assert_eq!(storage.load(SessionKey::Refresh).unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_login_failure_uses_fixed_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(LOGIN_PATH);
                then.status(401).json_body(json!({ "error": "Invalid credentials" }));
            })
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let gateway = gateway(&server, storage.clone());
        let err = gateway
            .login(&Credentials {
                email: "owner@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), LOGIN_FAILED);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_register_failure_uses_fixed_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(REGISTER_PATH);
                then.status(400).json_body(json!({ "password": ["This password is too short."] }));
            })
            .await;

        let gateway = gateway(&server, Arc::new(MemoryStorage::new()));
        let err = gateway
            .register(&Credentials {
                email: "new@example.com".into(),
                password: "x".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), REGISTER_FAILED);
    }

    fn signed_in_storage() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::with_values([
            (SessionKey::Access, "a1".to_string()),
            (SessionKey::Refresh, "r1".to_string()),
            (SessionKey::OrgId, "org-1".to_string()),
        ]))
    }

    #[tokio::test]
    async fn test_refresh_network_failure_keeps_session() {
        let storage = signed_in_storage();
        let state = Arc::new(AppState::load(storage.clone()).unwrap());
        let gateway = ApiGateway::new("http://127.0.0.1:9", state, Duration::from_secs(2)).unwrap();

        let err = gateway.refresh().await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(storage.len(), 3);
        let session = gateway.state().session().get().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("a1"));
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_malformed_refresh_response_signs_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(REFRESH_PATH)
                    .json_body(json!({ "refresh": "r1" }));
                then.status(200).body("{}");
            })
            .await;

        let storage = signed_in_storage();
        let gateway = gateway(&server, storage.clone());

        assert!(!gateway.refresh().await.unwrap());
        assert!(storage.is_empty());
        assert!(!gateway.state().session().get().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_refresh_runs_signed_out_hook() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(REFRESH_PATH);
                then.status(401).json_body(json!({ "detail": "Token is invalid or expired" }));
            })
            .await;

        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let gateway = gateway(&server, signed_in_storage()).with_signed_out_hook(Arc::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        assert!(!gateway.refresh().await.unwrap());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_is_false() {
        let server = MockServer::start_async().await;
        let refresh = server
            .mock_async(|when, then| {
                when.method(POST).path(REFRESH_PATH);
                then.status(200).json_body(json!({ "access": "a2" }));
            })
            .await;

        let gateway = gateway(&server, Arc::new(MemoryStorage::new()));
        assert!(!gateway.refresh().await.unwrap());
        refresh.assert_hits_async(0).await;
    }
}
