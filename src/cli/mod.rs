//! CLI entry point for Curator.

pub mod auth;
pub mod playback;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::{AuthSession, BrowserOpener, FileCredentialStore};
use crate::config::CuratorConfig;

/// Curator CLI
#[derive(Parser, Debug)]
#[command(name = "curator", version, about = "Curator: keep or skip the playing track")]
pub struct Cli {
    /// Session file holding the stored credentials
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
    /// Deliver an OAuth redirect URL opened by the OS
    Redirect(RedirectArgs),
    /// Show the track playing right now
    NowPlaying,
    /// Keep the current track and skip to the next one
    Keep,
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Make sure a valid access token exists, opening the browser if needed
    Login,
    /// Show which credentials are stored
    Status,
}

/// Arguments for `curator redirect`.
#[derive(Parser, Debug)]
pub struct RedirectArgs {
    /// Full redirect URL, e.g. playlist-curator://callback?code=...
    pub url: String,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the session from the loaded config and the selected session file.
    pub fn session(&self, config: &CuratorConfig) -> crate::error::Result<AuthSession> {
        let store = match &self.session_file {
            Some(path) => FileCredentialStore::new(path.clone()),
            None => FileCredentialStore::new_default(),
        };
        AuthSession::new(config, Arc::new(store), Arc::new(BrowserOpener))
    }
}
