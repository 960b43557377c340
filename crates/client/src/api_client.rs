//! REST gateway: one-shot calls for login, profile and notification mutations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use notiflow_shared::{
    ApiError, LoginRequest, LoginResponse, NotificationList, RemoteNotification, UserProfile,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Result, SyncError};
use crate::session::SessionStore;

/// One-shot REST operations the engine depends on.
///
/// Every call except `login` needs a credential and fails with
/// [`ApiError::Unauthenticated`] when none is stored.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// Exchange email and password for a credential. Bad credentials come
    /// back as an HTTP 401.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn fetch_profile(&self) -> Result<UserProfile, ApiError>;

    /// The user's notifications in the order the backend returns them.
    async fn fetch_notifications(&self) -> Result<Vec<RemoteNotification>, ApiError>;

    async fn mark_read(&self, id: &str) -> Result<(), ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

/// HTTP client for the notification backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: Url, session: Arc<dyn SessionStore>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn notification_path(id: &str) -> String {
        format!("api/notifications/{}", urlencoding::encode(id))
    }

    /// Build a request carrying the stored credential.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let credential = self.session.get().ok_or(ApiError::Unauthenticated)?;
        Ok(self
            .client
            .request(method, self.url(path))
            .bearer_auth(credential.expose()))
    }

    /// Send a request and return the body of a successful response.
    async fn execute(rb: RequestBuilder) -> Result<String, ApiError> {
        let resp = rb.send().await.map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }
        Ok(text)
    }

    async fn execute_json<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T, ApiError> {
        let text = Self::execute(rb).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }
}

#[async_trait]
impl FetchGateway for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let rb = self.client.post(self.url("api/auth/login")).json(&body);
        Self::execute_json(rb).await
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        Self::execute_json(self.authorized(Method::GET, "api/auth/me")?).await
    }

    async fn fetch_notifications(&self) -> Result<Vec<RemoteNotification>, ApiError> {
        let list: NotificationList =
            Self::execute_json(self.authorized(Method::GET, "api/notifications")?).await?;
        Ok(list.into_vec())
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("{}/read", Self::notification_path(id));
        Self::execute(self.authorized(Method::PUT, &path)?).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let path = Self::notification_path(id);
        Self::execute(self.authorized(Method::DELETE, &path)?).await?;
        Ok(())
    }
}
