use reqwest::Url;

/// Surface-specific way of sending the user to the authorize page.
///
/// Called by the session core when no credential path exists. The call is
/// fire-and-forget; implementations log their own failures.
pub trait AuthorizationOpener: Send + Sync {
    fn open_authorization_url(&self, url: &Url);
}

/// Opens the authorize page in the system browser.
///
/// The launcher is detached, so the caller never waits on the browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserOpener;

impl AuthorizationOpener for BrowserOpener {
    fn open_authorization_url(&self, url: &Url) {
        tracing::info!("opening authorization page in browser");
        if let Err(error) = open::that_detached(url.as_str()) {
            tracing::warn!(
                %error,
                url = %redact_client_secret(url),
                "failed to open browser, visit the URL manually"
            );
        }
    }
}

/// For surfaces that cannot show a browser (a wearable). Authorization has to
/// finish on the paired surface, whose tokens then arrive through sync.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompanionOpener;

impl AuthorizationOpener for CompanionOpener {
    fn open_authorization_url(&self, _url: &Url) {
        tracing::warn!("authorization required, complete sign-in on the paired device");
    }
}

/// Copy of `url` safe for logs: the `client_secret` value is masked.
pub(crate) fn redact_client_secret(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "client_secret" {
                "[redacted]".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted
}
