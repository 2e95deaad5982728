//! Reqwest-backed Grafana user API adapter.
//!
//! This adapter owns transport details: URL construction, basic auth, TLS
//! verification, timeouts, and the classification of Grafana's JSON bodies
//! into port outcomes.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;

use super::dto::{
    CreateUserDto, LookupResponseDto, MessageDto, PasswordResetDto, UpdateUserDto,
};
use crate::domain::ports::{GrafanaApiError, GrafanaUserApi, PasswordProbe, UserLookup};
use crate::domain::{AdminCredentials, RemoteUserId, UserAttributes};

/// Timeout applied to each request when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str = "grafana-user/0.1";
const USER_NOT_FOUND_MESSAGE: &str = "User not found";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Where and how to reach Grafana.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrafanaEndpoint {
    /// Base URL, optionally with a path prefix (`https://host/grafana`).
    pub base_url: String,
    /// Verify the server's TLS certificate.
    pub verify_tls: bool,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GrafanaEndpoint {
    /// Endpoint with TLS verification on and the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            verify_tls: true,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Grafana adapter issuing administrative calls with operator credentials.
#[derive(Debug)]
pub struct GrafanaHttpApi {
    client: Client,
    base_url: Url,
    admin: AdminCredentials,
}

impl GrafanaHttpApi {
    /// Build an adapter for one Grafana instance.
    /// ```rust,ignore
    /// let api = GrafanaHttpApi::new(GrafanaEndpoint::new("https://grafana.example.com"), admin)?;
    /// ```
    /// # Errors
    ///
    /// Returns [`GrafanaApiError::Transport`] when the base URL does not
    /// parse, is not http(s), or the reqwest client cannot be constructed.
    pub fn new(endpoint: GrafanaEndpoint, admin: AdminCredentials) -> Result<Self, GrafanaApiError> {
        let base_url = parse_base_url(&endpoint.base_url)?;
        let client = Client::builder()
            .timeout(endpoint.timeout)
            .danger_accept_invalid_certs(!endpoint.verify_tls)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|error| {
                GrafanaApiError::transport(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self {
            client,
            base_url,
            admin,
        })
    }

    fn url(&self, path: &str) -> Result<Url, GrafanaApiError> {
        self.base_url.join(path).map_err(|error| {
            GrafanaApiError::transport(format!("invalid endpoint path '{path}': {error}"))
        })
    }

    fn as_admin(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(self.admin.login(), Some(self.admin.password()))
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), GrafanaApiError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(%operation, status = status.as_u16(), "grafana request completed");
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl GrafanaUserApi for GrafanaHttpApi {
    async fn lookup_user(&self, login: &str) -> Result<UserLookup, GrafanaApiError> {
        let mut url = self.url("api/users/lookup")?;
        url.query_pairs_mut().append_pair("loginOrEmail", login);
        let (status, body) = self
            .execute("lookup", self.as_admin(self.client.get(url)))
            .await?;
        classify_lookup(status, &body)
    }

    async fn delete_user(&self, id: RemoteUserId) -> Result<(), GrafanaApiError> {
        let url = self.url(&format!("api/admin/users/{id}"))?;
        let (status, body) = self
            .execute("delete", self.as_admin(self.client.delete(url)))
            .await?;
        check_mutation(status, &body)
    }

    async fn create_user(
        &self,
        attributes: &UserAttributes,
        password: &str,
    ) -> Result<(), GrafanaApiError> {
        let url = self.url("api/admin/users")?;
        let request = self
            .client
            .post(url)
            .json(&CreateUserDto::new(attributes, password));
        let (status, body) = self.execute("create", self.as_admin(request)).await?;
        check_mutation(status, &body)
    }

    async fn probe_password(
        &self,
        login: &str,
        password: &str,
    ) -> Result<PasswordProbe, GrafanaApiError> {
        let url = self.url("api/org")?;
        let request = self.client.get(url).basic_auth(login, Some(password));
        let (status, body) = self.execute("probe", request).await?;
        classify_probe(status, &body)
    }

    async fn reset_password(
        &self,
        id: RemoteUserId,
        password: &str,
    ) -> Result<(), GrafanaApiError> {
        let url = self.url(&format!("api/admin/users/{id}/password"))?;
        let request = self.client.put(url).json(&PasswordResetDto { password });
        let (status, body) = self.execute("reset_password", self.as_admin(request)).await?;
        check_mutation(status, &body)
    }

    async fn update_user(
        &self,
        id: RemoteUserId,
        attributes: &UserAttributes,
    ) -> Result<(), GrafanaApiError> {
        let url = self.url(&format!("api/users/{id}"))?;
        let request = self
            .client
            .put(url)
            .json(&UpdateUserDto::from(attributes));
        let (status, body) = self.execute("update", self.as_admin(request)).await?;
        check_mutation(status, &body)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, GrafanaApiError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|error| {
        GrafanaApiError::transport(format!("invalid base URL '{trimmed}': {error}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GrafanaApiError::transport(format!(
            "base URL '{trimmed}' must use http or https"
        )));
    }
    // `Url::join` replaces the last segment unless the path ends with '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn message_of(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<MessageDto>(body)
        .ok()
        .and_then(|decoded| decoded.message)
}

fn classify_lookup(status: StatusCode, body: &[u8]) -> Result<UserLookup, GrafanaApiError> {
    let decoded: LookupResponseDto = serde_json::from_slice(body).map_err(|error| {
        GrafanaApiError::unexpected_response(format!(
            "lookup returned status {} with an undecodable body ({error}): {}",
            status.as_u16(),
            body_preview(body)
        ))
    })?;

    if decoded.message.as_deref() == Some(USER_NOT_FOUND_MESSAGE) {
        return Ok(UserLookup::NotFound);
    }
    let message = decoded.message.clone();
    if let Some(user) = decoded.into_remote_user() {
        return Ok(UserLookup::Found(user));
    }
    if message.as_deref() == Some(INVALID_CREDENTIALS_MESSAGE)
        || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    {
        return Err(GrafanaApiError::unauthorized(message.unwrap_or_else(|| {
            format!("lookup returned status {}", status.as_u16())
        })));
    }

    Err(GrafanaApiError::unexpected_response(format!(
        "lookup returned status {} with neither a user id nor a recognised message: {}",
        status.as_u16(),
        body_preview(body)
    )))
}

fn classify_probe(status: StatusCode, body: &[u8]) -> Result<PasswordProbe, GrafanaApiError> {
    if message_of(body).as_deref() == Some(INVALID_CREDENTIALS_MESSAGE) {
        return Ok(PasswordProbe::Rejected);
    }
    if status.is_success() {
        return Ok(PasswordProbe::Accepted);
    }
    Err(GrafanaApiError::unexpected_response(format!(
        "password probe returned status {}: {}",
        status.as_u16(),
        body_preview(body)
    )))
}

fn check_mutation(status: StatusCode, body: &[u8]) -> Result<(), GrafanaApiError> {
    if !status.is_success() {
        return Err(map_status_error(status, body));
    }
    // Grafana may report an authentication failure inside a 2xx body.
    match message_of(body) {
        Some(message) if message == INVALID_CREDENTIALS_MESSAGE => {
            Err(GrafanaApiError::unauthorized(message))
        }
        _ => Ok(()),
    }
}

fn map_transport_error(error: reqwest::Error) -> GrafanaApiError {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    if error.is_timeout() {
        GrafanaApiError::timeout(message)
    } else {
        GrafanaApiError::transport(message)
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GrafanaApiError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        "empty response body".to_owned()
    } else {
        preview
    };

    match status {
        StatusCode::UNAUTHORIZED => GrafanaApiError::unauthorized(message),
        _ => GrafanaApiError::rejected(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
