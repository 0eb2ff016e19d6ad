//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthError, AuthSession, AuthorizationOpener, BrowserOpener, CompanionOpener,
    CredentialState, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
pub use crate::config::CuratorConfig;
pub use crate::error::{CuratorError, Result};
pub use crate::redirect::RedirectHandler;
pub use crate::sync::{PairedSurface, SyncChannel, SyncedStore};
