//! CLI handlers for playback commands.

use crate::auth::AuthSession;
use crate::player;

/// Handle `curator now-playing`.
pub async fn handle_now_playing(session: &AuthSession) -> Result<(), Box<dyn std::error::Error>> {
    match player::now_playing(session).await? {
        Some(playing) => {
            let state = if playing.is_playing { "▶" } else { "⏸" };
            println!("{state} {}", playing.track_name);
            match playing.playlist_id() {
                Some(id) => {
                    let name = player::playlist_name(session, id).await?;
                    println!("   playlist: {name}");
                }
                None => println!("   not playing from a playlist"),
            }
        }
        None => println!("Nothing playing"),
    }
    Ok(())
}

/// Handle `curator keep`.
pub async fn handle_keep(session: &AuthSession) -> Result<(), Box<dyn std::error::Error>> {
    player::skip_to_next(session).await?;
    println!("✅ Kept, skipped to next track");
    Ok(())
}
