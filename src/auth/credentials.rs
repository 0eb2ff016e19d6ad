use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::error::AuthError;
use super::store::CredentialStore;

/// Seconds of remaining lifetime below which a cached access token is renewed.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Full key-value view of a store, as broadcast to a paired surface.
pub type Snapshot = BTreeMap<String, String>;

/// Persisted credential field names, shared with the paired surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum CredentialKey {
    AuthorizationCode,
    AccessToken,
    AccessTokenExpiration,
    RefreshToken,
}

impl CredentialKey {
    pub fn all() -> impl Iterator<Item = CredentialKey> {
        CredentialKey::iter()
    }
}

/// Credential record read back from a [`CredentialStore`].
///
/// This is a point-in-time copy; the store stays the source of truth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    pub authorization_code: Option<String>,
    pub access_token: Option<String>,
    pub access_token_expiration: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
}

impl CredentialState {
    /// Read every credential field from the store.
    pub fn load(store: &dyn CredentialStore) -> Result<Self, AuthError> {
        Ok(Self {
            authorization_code: store.get(CredentialKey::AuthorizationCode.as_ref())?,
            access_token: store.get(CredentialKey::AccessToken.as_ref())?,
            access_token_expiration: store
                .get(CredentialKey::AccessTokenExpiration.as_ref())?
                .as_deref()
                .and_then(parse_expiration),
            refresh_token: store.get(CredentialKey::RefreshToken.as_ref())?,
        })
    }

    /// Build a record from the known keys of a snapshot. Unknown keys are ignored.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::default().merge(snapshot)
    }

    /// Overlay the known keys present in `incoming`. Absent keys keep their
    /// current value.
    pub fn merge(&self, incoming: &Snapshot) -> Self {
        let mut merged = self.clone();
        for (name, value) in incoming {
            let Ok(key) = name.parse::<CredentialKey>() else {
                continue;
            };
            match key {
                CredentialKey::AuthorizationCode => {
                    merged.authorization_code = Some(value.clone())
                }
                CredentialKey::AccessToken => merged.access_token = Some(value.clone()),
                CredentialKey::AccessTokenExpiration => {
                    merged.access_token_expiration = parse_expiration(value)
                }
                CredentialKey::RefreshToken => merged.refresh_token = Some(value.clone()),
            }
        }
        merged
    }

    /// Returns the access token if it outlives `now` by more than the margin.
    pub fn valid_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        let expires_at = self.access_token_expiration?;
        if expires_at - now > Duration::seconds(EXPIRY_MARGIN_SECS) {
            Some(token)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub(crate) fn format_expiration(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub(crate) fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
