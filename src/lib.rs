//! Curator: keep-or-remove playlist curation for Spotify.
//!
//! The reusable part is the OAuth session core: it persists credentials in a
//! shared key-value store, renews access tokens behind a single lock, and
//! mirrors the store to a paired surface so both ends share one session.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use curator::prelude::*;
//!
//! # async fn example() -> curator::error::Result<()> {
//! let config = CuratorConfig::load()?;
//! let session = AuthSession::new(
//!     &config,
//!     Arc::new(FileCredentialStore::new_default()),
//!     Arc::new(BrowserOpener),
//! )?;
//! if let Some(playing) = curator::player::now_playing(&session).await? {
//!     println!("{} ({:?})", playing.track_name, playing.playlist_uri);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod player;
pub mod prelude;
pub mod redirect;
pub mod sync;

#[cfg(feature = "cli")]
pub mod cli;
