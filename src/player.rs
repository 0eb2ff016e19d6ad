//! Playback calls made through the session core.

use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::auth::AuthSession;
use crate::error::{CuratorError, Result};

/// Track currently playing on the user's active device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub track_name: String,
    pub track_uri: String,
    pub is_playing: bool,
    /// Set only when playback was started from a playlist.
    pub playlist_uri: Option<String>,
}

impl NowPlaying {
    /// `spotify:playlist:<id>` -> `<id>`.
    pub fn playlist_id(&self) -> Option<&str> {
        self.playlist_uri.as_deref()?.rsplit(':').next()
    }
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlayingResponse {
    #[serde(default)]
    is_playing: bool,
    item: Option<PlayingItem>,
    context: Option<PlaybackContext>,
}

#[derive(Debug, Deserialize)]
struct PlayingItem {
    name: String,
    uri: String,
}

#[derive(Debug, Deserialize)]
struct PlaybackContext {
    #[serde(rename = "type")]
    kind: String,
    uri: String,
}

/// Fetch the current track. `None` when nothing is playing.
pub async fn now_playing(session: &AuthSession) -> Result<Option<NowPlaying>> {
    let request = session
        .build_authorized_request("/v1/me/player/currently-playing", &[])
        .await?;
    let resp = session.http_client().execute(request).await?;
    let status = resp.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CuratorError::api(status.as_u16(), body));
    }
    let payload: CurrentlyPlayingResponse = resp.json().await?;
    let Some(item) = payload.item else {
        return Ok(None);
    };
    let playlist_uri = payload
        .context
        .filter(|context| context.kind == "playlist")
        .map(|context| context.uri);
    Ok(Some(NowPlaying {
        track_name: item.name,
        track_uri: item.uri,
        is_playing: payload.is_playing,
        playlist_uri,
    }))
}

#[derive(Debug, Deserialize)]
struct PlaylistSummary {
    name: String,
}

/// Look up a playlist's display name by id.
pub async fn playlist_name(session: &AuthSession, playlist_id: &str) -> Result<String> {
    let request = session
        .build_authorized_request(&format!("/v1/playlists/{playlist_id}"), &[("fields", "name")])
        .await?;
    let resp = session.http_client().execute(request).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CuratorError::api(status.as_u16(), body));
    }
    let playlist: PlaylistSummary = resp.json().await?;
    Ok(playlist.name)
}

/// Skip to the next track, which is how a track is kept.
pub async fn skip_to_next(session: &AuthSession) -> Result<()> {
    let mut request = session
        .build_authorized_request("/v1/me/player/next", &[])
        .await?;
    *request.method_mut() = Method::POST;
    let resp = session.http_client().execute(request).await?;
    let status = resp.status();
    if status.is_success() {
        tracing::debug!(%status, "skipped to next track");
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(CuratorError::api(status.as_u16(), body))
}
