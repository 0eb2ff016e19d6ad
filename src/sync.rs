//! Mirrors the credential store to a paired surface (phone to wearable).
//!
//! Every local write broadcasts the full store snapshot. The receiving side
//! overwrites the credential keys present in the snapshot and leaves the rest
//! alone. Delivery is fire-and-forget with last-write-wins per key.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::credentials::{CredentialKey, Snapshot};
use crate::auth::error::AuthError;
use crate::auth::store::CredentialStore;

/// Transport to the paired surface.
pub trait PairedSurface: Send + Sync {
    fn update_context(&self, snapshot: Snapshot) -> Result<(), AuthError>;
}

/// Outbound half of the sync channel.
#[derive(Clone)]
pub struct SyncChannel {
    surface: Arc<dyn PairedSurface>,
}

impl SyncChannel {
    pub fn new(surface: Arc<dyn PairedSurface>) -> Self {
        Self { surface }
    }

    /// Deliver a snapshot. Failures are logged, never returned.
    pub fn broadcast(&self, snapshot: Snapshot) {
        let keys = snapshot.len();
        match self.surface.update_context(snapshot) {
            Ok(()) => tracing::debug!(keys, "broadcast credentials to paired surface"),
            Err(error) => {
                tracing::warn!(%error, "failed to propagate credentials to paired surface")
            }
        }
    }
}

/// Store wrapper that broadcasts the whole snapshot after every write.
///
/// Snapshots received from the paired surface go through
/// [`SyncedStore::apply_remote`], which writes to the inner store directly so
/// they are not echoed back.
pub struct SyncedStore {
    inner: Arc<dyn CredentialStore>,
    channel: SyncChannel,
}

impl SyncedStore {
    pub fn new(inner: Arc<dyn CredentialStore>, channel: SyncChannel) -> Self {
        Self { inner, channel }
    }

    pub fn inner(&self) -> &Arc<dyn CredentialStore> {
        &self.inner
    }

    pub fn apply_remote(&self, incoming: &Snapshot) -> Result<usize, AuthError> {
        apply_snapshot(self.inner.as_ref(), incoming)
    }
}

impl CredentialStore for SyncedStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<(), AuthError> {
        self.inner.set(key, value)?;
        match self.inner.snapshot() {
            Ok(snapshot) => self.channel.broadcast(snapshot),
            Err(error) => tracing::warn!(%error, key, "failed to snapshot store for sync"),
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Snapshot, AuthError> {
        self.inner.snapshot()
    }
}

/// Write the known credential keys present in `incoming` to `store`.
///
/// Unknown keys are skipped and absent keys are left untouched. Returns the
/// number of keys written.
pub fn apply_snapshot(store: &dyn CredentialStore, incoming: &Snapshot) -> Result<usize, AuthError> {
    let mut applied = 0;
    for key in CredentialKey::all() {
        if let Some(value) = incoming.get(key.as_ref()) {
            store.set(key.as_ref(), Some(value.as_str()))?;
            applied += 1;
        }
    }
    Ok(applied)
}

/// In-process surface that keeps only the latest snapshot, like an
/// application context that replaces its previous value.
pub struct ChannelSurface {
    sender: watch::Sender<Snapshot>,
}

impl ChannelSurface {
    /// Create a surface and the receiver for the paired end.
    pub fn pair() -> (Self, watch::Receiver<Snapshot>) {
        let (sender, receiver) = watch::channel(Snapshot::new());
        (Self { sender }, receiver)
    }
}

impl PairedSurface for ChannelSurface {
    fn update_context(&self, snapshot: Snapshot) -> Result<(), AuthError> {
        self.sender
            .send(snapshot)
            .map_err(|_| AuthError::Internal("paired surface is not listening".to_string()))
    }
}

/// Apply every snapshot the paired end publishes to `store` until the sender
/// goes away. Pass the un-synced store so remote writes are not echoed.
pub fn spawn_receiver(
    mut receiver: watch::Receiver<Snapshot>,
    store: Arc<dyn CredentialStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            let snapshot = receiver.borrow_and_update().clone();
            match apply_snapshot(store.as_ref(), &snapshot) {
                Ok(applied) => tracing::debug!(applied, "applied credentials from paired surface"),
                Err(error) => tracing::warn!(%error, "failed to apply credentials from paired surface"),
            }
        }
        tracing::debug!("paired surface disconnected");
    })
}
