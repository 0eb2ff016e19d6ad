//! Phone-to-watch credential mirroring over the in-process channel surface.

mod auth_support;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use curator::auth::{
    AuthSession, CredentialKey, CredentialState, CredentialStore, MemoryCredentialStore, Snapshot,
};
use curator::sync::{spawn_receiver, ChannelSurface, SyncChannel, SyncedStore};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{config, get, token_body, token_requests, RecordingOpener};

async fn wait_for(store: &dyn CredentialStore, key: CredentialKey, expected: &str) {
    tokio::time::timeout(StdDuration::from_secs(2), async {
        loop {
            if get(store, key).as_deref() == Some(expected) {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{key} never reached {expected}"));
}

async fn wait_until_valid(store: &dyn CredentialStore, expected: &str) {
    tokio::time::timeout(StdDuration::from_secs(2), async {
        loop {
            let state = CredentialState::load(store).unwrap();
            if state.valid_access_token(Utc::now()) == Some(expected) {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("access token {expected} never became valid"));
}

#[tokio::test]
async fn phone_renewal_reaches_watch_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("A1", 3600, Some("R2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (surface, receiver) = ChannelSurface::pair();
    let phone_store = Arc::new(SyncedStore::new(
        Arc::new(MemoryCredentialStore::new()),
        SyncChannel::new(Arc::new(surface)),
    ));
    phone_store
        .set(CredentialKey::RefreshToken.as_ref(), Some("R1"))
        .unwrap();
    let phone = AuthSession::new(
        &config(&server),
        phone_store.clone(),
        Arc::new(RecordingOpener::new()),
    )
    .unwrap();

    let watch_store = Arc::new(MemoryCredentialStore::new());
    let receiver_task = spawn_receiver(receiver, watch_store.clone());
    let watch_opener = Arc::new(RecordingOpener::new());
    let watch = AuthSession::new(&config(&server), watch_store.clone(), watch_opener.clone())
        .unwrap();

    assert_eq!(phone.ensure_access_token().await.unwrap(), "A1");
    wait_for(watch_store.as_ref(), CredentialKey::RefreshToken, "R2").await;
    wait_until_valid(watch_store.as_ref(), "A1").await;

    assert_eq!(watch.ensure_access_token().await.unwrap(), "A1");
    assert!(watch_opener.opened().is_empty());
    assert_eq!(token_requests(&server).await, 1);

    drop(phone);
    drop(phone_store);
    receiver_task.await.unwrap();
}

#[tokio::test]
async fn remote_snapshot_overrides_only_present_keys() {
    let local = MemoryCredentialStore::with_values(
        [
            ("accessToken", "OLD"),
            ("refreshToken", "R1"),
            ("authorizationCode", "C1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    );
    let remote: Snapshot = [
        ("accessToken".to_string(), "NEW".to_string()),
        ("theme".to_string(), "dark".to_string()),
    ]
    .into_iter()
    .collect();

    let before = CredentialState::load(&local).unwrap();
    let applied = curator::sync::apply_snapshot(&local, &remote).unwrap();
    let after = CredentialState::load(&local).unwrap();

    assert_eq!(applied, 1);
    assert_eq!(after, before.merge(&remote));
    assert_eq!(after.access_token.as_deref(), Some("NEW"));
    assert_eq!(after.refresh_token.as_deref(), Some("R1"));
    assert_eq!(after.authorization_code.as_deref(), Some("C1"));
    assert_eq!(local.get("theme").unwrap(), None);
}

#[tokio::test]
async fn receiver_keeps_latest_snapshot_only() {
    let (surface, receiver) = ChannelSurface::pair();
    let phone_store = SyncedStore::new(
        Arc::new(MemoryCredentialStore::new()),
        SyncChannel::new(Arc::new(surface)),
    );
    for token in ["T1", "T2", "T3"] {
        phone_store
            .set(CredentialKey::AccessToken.as_ref(), Some(token))
            .unwrap();
    }

    let watch_store = Arc::new(MemoryCredentialStore::new());
    let task = spawn_receiver(receiver, watch_store.clone());
    wait_for(watch_store.as_ref(), CredentialKey::AccessToken, "T3").await;

    drop(phone_store);
    task.await.unwrap();
}
