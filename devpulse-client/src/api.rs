//! Best-effort calls to the DevPulse server.
//!
//! Nothing the UI does waits on these. Local state is updated and saved first; the request
//! follows, and a failure is logged and otherwise ignored.

use std::future::Future;

use devpulse_types::{
    notification::{MarkReadRequest, Notification},
    profile::Profile,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status { status, body })
        }
    }

    /// `GET /api/notifications`. A body that isn't a JSON array counts as no notifications.
    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let request = self.authorize(self.http.get(self.url("/api/notifications")));
        let response = Self::check(request.send().await?).await?;
        let body: serde_json::Value = serde_json::from_str(&response.text().await?)?;
        match body {
            serde_json::Value::Array(_) => Ok(serde_json::from_value(body)?),
            other => {
                log::warn!("Expected a list of notifications, got {other}");
                Ok(Vec::new())
            }
        }
    }

    /// `POST /api/notifications/mark-read`
    pub async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        let body = MarkReadRequest { id: id.to_string() };
        let request = self
            .authorize(self.http.post(self.url("/api/notifications/mark-read")))
            .json(&body);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// `POST /api/profile` with the whole profile document.
    pub async fn save_profile(&self, profile: &Profile) -> Result<(), ApiError> {
        let request = self
            .authorize(self.http.post(self.url("/api/profile")))
            .json(profile);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// Fire-and-forget [`mark_read`](Self::mark_read). Failures are only logged. On native
    /// targets the request is dropped unless this is called inside a tokio runtime.
    pub fn mark_read_in_background(&self, id: String) {
        let client = self.clone();
        spawn_logged("mark notification read", async move {
            client.mark_read(&id).await
        });
    }

    /// Fire-and-forget [`save_profile`](Self::save_profile), with the same runtime caveat as
    /// [`mark_read_in_background`](Self::mark_read_in_background).
    pub fn save_profile_in_background(&self, profile: Profile) {
        let client = self.clone();
        spawn_logged("save profile", async move {
            client.save_profile(&profile).await
        });
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_logged<F>(what: &'static str, request: F)
where
    F: Future<Output = Result<(), ApiError>> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(async move {
                if let Err(e) = request.await {
                    log::warn!("Failed to {what}: {e}");
                }
            });
        }
        Err(_) => log::warn!("No async runtime, skipping request to {what}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_logged<F>(what: &'static str, request: F)
where
    F: Future<Output = Result<(), ApiError>> + 'static,
{
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = request.await {
            log::warn!("Failed to {what}: {e}");
        }
    });
}
