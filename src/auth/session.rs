use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::credentials::{format_expiration, CredentialKey, CredentialState};
use super::error::AuthError;
use super::opener::AuthorizationOpener;
use super::store::CredentialStore;
use crate::config::CuratorConfig;
use crate::error::CuratorError;

/// Session core: owns the token lifecycle and hands out authorized requests.
///
/// Every credential read, write, and token exchange runs under one renewal
/// lock, so concurrent callers observe a consistent record and at most one
/// exchange is in flight. The store is re-read on each check; nothing is
/// cached in memory.
///
/// Cloning is cheap and clones share the same lock.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use curator::auth::{AuthSession, BrowserOpener, FileCredentialStore};
/// use curator::config::CuratorConfig;
///
/// # async fn example() -> curator::error::Result<()> {
/// let config = CuratorConfig::load()?;
/// let session = AuthSession::new(
///     &config,
///     Arc::new(FileCredentialStore::new_default()),
///     Arc::new(BrowserOpener),
/// )?;
/// let request = session
///     .build_authorized_request("/v1/me/player/currently-playing", &[])
///     .await?;
/// let response = session.http_client().execute(request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    authorize_url: Url,
    token_url: Url,
    api_base_url: Url,
    store: Arc<dyn CredentialStore>,
    opener: Arc<dyn AuthorizationOpener>,
    renewal: Mutex<()>,
}

/// How a token exchange proves the client's right to a new access token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Grant {
    RefreshToken(String),
    AuthorizationCode(String),
}

impl Grant {
    fn grant_type(&self) -> &'static str {
        match self {
            Self::RefreshToken(_) => "refresh_token",
            Self::AuthorizationCode(_) => "authorization_code",
        }
    }

    fn credential_param(&self) -> (&'static str, &str) {
        match self {
            Self::RefreshToken(token) => ("refresh_token", token),
            Self::AuthorizationCode(code) => ("code", code),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    #[serde(default, deserialize_with = "string_or_none")]
    refresh_token: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    error: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    error_description: Option<String>,
}

/// Optional string fields that are not strings read as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value.as_str().map(str::to_owned)))
}

impl AuthSession {
    pub fn new(
        config: &CuratorConfig,
        store: Arc<dyn CredentialStore>,
        opener: Arc<dyn AuthorizationOpener>,
    ) -> Result<Self, CuratorError> {
        Self::with_http_client(config, store, opener, reqwest::Client::new())
    }

    pub fn with_http_client(
        config: &CuratorConfig,
        store: Arc<dyn CredentialStore>,
        opener: Arc<dyn AuthorizationOpener>,
        client: reqwest::Client,
    ) -> Result<Self, CuratorError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                redirect_uri: config.redirect_uri.clone(),
                scope: config.scope_param(),
                authorize_url: config.authorize_url()?,
                token_url: config.token_url()?,
                api_base_url: config.api_base_url()?,
                store,
                opener,
                renewal: Mutex::new(()),
            }),
        })
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Current credential record, read under the renewal lock.
    pub async fn credentials(&self) -> Result<CredentialState, AuthError> {
        let _guard = self.inner.renewal.lock().await;
        CredentialState::load(self.inner.store.as_ref())
    }

    /// Authorize page URL with client parameters and the fixed scope list.
    pub fn authorization_url(&self) -> Url {
        self.inner.authorization_url()
    }

    /// Build a GET request against the API host carrying a bearer token.
    ///
    /// Callers needing another method set it with `Request::method_mut`.
    /// Fails with [`AuthError::NotAuthenticated`] when the user has to
    /// authorize first; the request must not be sent in that case.
    pub async fn build_authorized_request(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Request, AuthError> {
        let url = self.inner.api_url(path, query)?;
        let token = self.ensure_access_token().await?;
        let request = self
            .inner
            .client
            .get(url)
            .header("Authorization", format!("Bearer {token}"))
            .build()?;
        Ok(request)
    }

    /// Return a usable access token, renewing it when it is missing or
    /// expires within the margin.
    ///
    /// The work runs in a spawned task, so a caller that stops waiting does
    /// not cancel an exchange already in flight.
    pub async fn ensure_access_token(&self) -> Result<String, AuthError> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.ensure_access_token().await }).await?
    }

    /// Accept the query items of an OS redirect.
    ///
    /// Anything other than exactly one non-empty `code` item is ignored. A
    /// valid code is stored and a background exchange is started; its handle
    /// is returned for callers that want to wait on it. Failures of that
    /// exchange are logged only.
    pub async fn handle_redirect(&self, query: &[(String, String)]) -> Option<JoinHandle<()>> {
        let [(name, code)] = query else {
            tracing::debug!(items = query.len(), "ignoring redirect with unexpected shape");
            return None;
        };
        if name != "code" || code.is_empty() {
            tracing::debug!(item = %name, "ignoring redirect without authorization code");
            return None;
        }

        {
            let _guard = self.inner.renewal.lock().await;
            if let Err(error) = self
                .inner
                .store
                .set(CredentialKey::AuthorizationCode.as_ref(), Some(code.as_str()))
            {
                tracing::warn!(%error, "failed to store authorization code");
                return None;
            }
        }
        tracing::debug!("stored authorization code");

        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            match inner.ensure_access_token().await {
                Ok(_) => tracing::info!("authorization completed"),
                Err(error) => tracing::warn!(%error, "token exchange after redirect failed"),
            }
        }))
    }
}

impl SessionInner {
    fn authorization_url(&self) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scope);
        url
    }

    fn api_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, AuthError> {
        let mut url = self
            .api_base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AuthError::Internal(format!("invalid API path {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn ensure_access_token(&self) -> Result<String, AuthError> {
        let _guard = self.renewal.lock().await;

        let state = CredentialState::load(self.store.as_ref())?;
        if let Some(token) = state.valid_access_token(Utc::now()) {
            tracing::debug!("using cached access token");
            return Ok(token.to_string());
        }

        let grant = if let Some(refresh_token) = state.refresh_token {
            Grant::RefreshToken(refresh_token)
        } else if let Some(code) = state.authorization_code {
            Grant::AuthorizationCode(code)
        } else {
            self.opener.open_authorization_url(&self.authorization_url());
            return Err(AuthError::NotAuthenticated);
        };

        let payload = self.exchange(&grant).await?;
        self.persist(&grant, payload)
    }

    async fn exchange(&self, grant: &Grant) -> Result<TokenResponse, AuthError> {
        tracing::debug!(grant = grant.grant_type(), "requesting access token");
        let params = [
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", grant.grant_type()),
            grant.credential_param(),
        ];
        let resp = self
            .client
            .post(self.token_url.clone())
            .header("Accept", "application/json")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&params)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            AuthError::InvalidResponse(format!(
                "Token endpoint returned unparseable body (status {status}): {e}"
            ))
        })
    }

    fn persist(&self, grant: &Grant, payload: TokenResponse) -> Result<String, AuthError> {
        let (access_token, expires_in) = match (payload.access_token, payload.expires_in) {
            (Some(token), Some(expires_in)) => (token, expires_in),
            (token, _) => {
                let missing = if token.is_none() {
                    "access_token"
                } else {
                    "expires_in"
                };
                let reason = payload
                    .error_description
                    .or(payload.error)
                    .map(|e| format!(" ({e})"))
                    .unwrap_or_default();
                return Err(AuthError::InvalidResponse(format!(
                    "Token response missing {missing}{reason}"
                )));
            }
        };
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!("Token expires_in out of range: {expires_in}"))
            })?;

        // Refresh token first, expiration last: a partial write must still
        // read as expired.
        if let Some(refresh_token) = payload.refresh_token {
            self.store
                .set(CredentialKey::RefreshToken.as_ref(), Some(refresh_token.as_str()))?;
        }
        self.store
            .set(CredentialKey::AccessToken.as_ref(), Some(access_token.as_str()))?;
        self.store.set(
            CredentialKey::AccessTokenExpiration.as_ref(),
            Some(format_expiration(expires_at).as_str()),
        )?;
        if let Grant::AuthorizationCode(_) = grant {
            self.store
                .set(CredentialKey::AuthorizationCode.as_ref(), None)?;
        }

        tracing::info!(grant = grant.grant_type(), expires_in, "access token renewed");
        Ok(access_token)
    }
}
