#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use curator::auth::{
    AuthSession, AuthorizationOpener, CredentialKey, CredentialStore, MemoryCredentialStore,
};
use curator::config::CuratorConfig;
use reqwest::Url;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Opener that records authorize URLs instead of launching a browser.
#[derive(Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<Url>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().expect("opener lock poisoned").clone()
    }
}

impl AuthorizationOpener for RecordingOpener {
    fn open_authorization_url(&self, url: &Url) {
        self.opened
            .lock()
            .expect("opener lock poisoned")
            .push(url.clone());
    }
}

pub fn config(server: &MockServer) -> CuratorConfig {
    CuratorConfig::builder()
        .client_id("client-id")
        .client_secret("client-secret")
        .redirect_uri("playlist-curator://callback")
        .accounts_url(server.uri())
        .api_url(server.uri())
        .build()
}

pub struct Harness {
    pub session: AuthSession,
    pub store: Arc<MemoryCredentialStore>,
    pub opener: Arc<RecordingOpener>,
}

pub fn harness(server: &MockServer) -> Harness {
    harness_with_store(server, Arc::new(MemoryCredentialStore::new()))
}

pub fn harness_with_store(server: &MockServer, store: Arc<MemoryCredentialStore>) -> Harness {
    let opener = Arc::new(RecordingOpener::new());
    let session = AuthSession::new(&config(server), store.clone(), opener.clone())
        .expect("session config is valid");
    Harness {
        session,
        store,
        opener,
    }
}

pub fn set(store: &dyn CredentialStore, key: CredentialKey, value: &str) {
    store
        .set(key.as_ref(), Some(value))
        .expect("store write succeeds");
}

pub fn get(store: &dyn CredentialStore, key: CredentialKey) -> Option<String> {
    store.get(key.as_ref()).expect("store read succeeds")
}

/// Seed an access token expiring `secs` from now (negative for the past).
pub fn seed_access_token(store: &dyn CredentialStore, token: &str, secs: i64) {
    set(store, CredentialKey::AccessToken, token);
    set(
        store,
        CredentialKey::AccessTokenExpiration,
        &(Utc::now() + Duration::seconds(secs)).to_rfc3339(),
    );
}

pub fn token_body(access_token: &str, expires_in: i64, refresh_token: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "scope": "user-read-playback-state",
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body
}

pub async fn token_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|request| request.url.path() == "/api/token")
        .count()
}
