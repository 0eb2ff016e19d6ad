//! Bridges OS "open URL" callbacks into the session core.

use reqwest::Url;
use tokio::task::JoinHandle;

use crate::auth::AuthSession;

/// Entry point for the custom URL scheme registered as the OAuth redirect.
#[derive(Clone)]
pub struct RedirectHandler {
    session: AuthSession,
}

impl RedirectHandler {
    pub fn new(session: AuthSession) -> Self {
        Self { session }
    }

    /// Handle an opened URL such as `playlist-curator://callback?code=...`.
    ///
    /// Unparseable URLs are dropped. Returns the background exchange handle
    /// when a code was accepted.
    pub async fn handle_url(&self, raw: &str) -> Option<JoinHandle<()>> {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(error) => {
                tracing::debug!(%error, "dropping unparseable redirect URL");
                return None;
            }
        };
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        self.session.handle_redirect(&query).await
    }

    /// Handle a GetURL-style event whose direct parameter may be missing.
    pub async fn handle_url_event(&self, direct_object: Option<&str>) -> Option<JoinHandle<()>> {
        match direct_object {
            Some(raw) => self.handle_url(raw).await,
            None => {
                tracing::debug!("dropping URL event without a URL");
                None
            }
        }
    }
}
