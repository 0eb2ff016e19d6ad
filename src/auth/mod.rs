//! OAuth authorization-code session: credential storage and token renewal.

pub mod credentials;
pub mod error;
pub mod opener;
pub mod session;
pub mod store;

pub use credentials::{CredentialKey, CredentialState, Snapshot, EXPIRY_MARGIN_SECS};
pub use error::AuthError;
pub use opener::{AuthorizationOpener, BrowserOpener, CompanionOpener};
pub use session::AuthSession;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
