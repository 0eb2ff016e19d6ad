//! CLI auth command handlers for login, status, and redirects.

use chrono::Utc;

use crate::auth::{AuthError, AuthSession, CredentialState};
use crate::redirect::RedirectHandler;

/// Handle `curator auth login`.
pub async fn handle_login(session: &AuthSession) -> Result<(), Box<dyn std::error::Error>> {
    match session.ensure_access_token().await {
        Ok(_) => {
            let state = session.credentials().await?;
            println!("✅ Logged in{}", expiry_suffix(&state));
            Ok(())
        }
        Err(AuthError::NotAuthenticated) => {
            println!("🔗 Finish authorizing in your browser.");
            println!("   If it did not open, visit: {}", session.authorization_url());
            println!("⏳ The app's URL handler will run `curator redirect <url>` when you are done.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle `curator auth status`.
pub async fn handle_status(session: &AuthSession) -> Result<(), Box<dyn std::error::Error>> {
    let state = session.credentials().await?;

    println!("🔐 Authentication Status\n");
    let access = match (&state.access_token, state.valid_access_token(Utc::now())) {
        (_, Some(_)) => format!("✅ Valid{}", expiry_suffix(&state)),
        (Some(_), None) => "⚠️  Expired (will refresh on next call)".to_string(),
        (None, None) => "❌ None".to_string(),
    };
    println!("  Access token: {access}");
    println!("  Refresh token: {}", presence(state.refresh_token.is_some()));
    println!(
        "  Authorization code: {}",
        presence(state.authorization_code.is_some())
    );
    Ok(())
}

/// Handle `curator redirect <url>` and wait for the token exchange it starts.
pub async fn handle_redirect(
    session: &AuthSession,
    url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let handler = RedirectHandler::new(session.clone());
    let Some(exchange) = handler.handle_url(url).await else {
        eprintln!("⚠️  Ignored redirect: expected exactly one `code` parameter");
        return Ok(());
    };
    exchange.await?;

    let state = session.credentials().await?;
    if state.valid_access_token(Utc::now()).is_some() {
        println!("✅ Authorization complete{}", expiry_suffix(&state));
    } else {
        println!("❌ Token exchange failed; run `curator auth login` to retry");
    }
    Ok(())
}

fn expiry_suffix(state: &CredentialState) -> String {
    state
        .access_token_expiration
        .map(|at| format!(" (expires {})", at.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default()
}

fn presence(present: bool) -> &'static str {
    if present {
        "✅ Stored"
    } else {
        "❌ None"
    }
}
