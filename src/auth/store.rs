use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::Snapshot;
use super::error::AuthError;

const SESSION_FILE_VERSION: u32 = 1;

/// Shared key-value storage backing the credential record.
///
/// Implementations must not cache: the session core re-reads on every check
/// so writes arriving from a paired surface are observed.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    /// Write `value` under `key`; `None` removes the key.
    fn set(&self, key: &str, value: Option<&str>) -> Result<(), AuthError>;
    /// Every key currently stored, credential or not.
    fn snapshot(&self) -> Result<Snapshot, AuthError>;
}

/// Process-local store, handy for tests and for embedding a surface that
/// persists elsewhere.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<Snapshot>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Snapshot) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Snapshot>, AuthError> {
        self.values
            .lock()
            .map_err(|_| AuthError::Internal("credential store lock poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<(), AuthError> {
        let mut values = self.lock()?;
        match value {
            Some(value) => values.insert(key.to_string(), value.to_string()),
            None => values.remove(key),
        };
        Ok(())
    }

    fn snapshot(&self) -> Result<Snapshot, AuthError> {
        Ok(self.lock()?.clone())
    }
}

/// File-backed store persisting the key-value map as TOML.
///
/// # Example
/// ```no_run
/// use curator::auth::{CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new_default();
/// store.set("accessToken", Some("BQD..."))?;
/// assert_eq!(store.get("accessToken")?.as_deref(), Some("BQD..."));
/// # Ok::<(), curator::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_curator_dir().join("session.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_values(&self) -> Result<Snapshot, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Snapshot::new())
            }
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        if file.version != SESSION_FILE_VERSION {
            return Err(AuthError::Serialization(format!(
                "Unsupported session file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file.values)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.read_values()?.remove(key))
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<(), AuthError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuthError::Internal("session file lock poisoned".to_string()))?;
        let mut values = self.read_values()?;
        match value {
            Some(value) => values.insert(key.to_string(), value.to_string()),
            None => values.remove(key),
        };
        let file = SessionFile {
            version: SESSION_FILE_VERSION,
            saved_at: Utc::now(),
            values,
        };
        let serialized = toml::to_string(&file)?;
        atomic_write(&self.path, serialized.as_bytes())
    }

    fn snapshot(&self) -> Result<Snapshot, AuthError> {
        self.read_values()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    saved_at: DateTime<Utc>,
    values: BTreeMap<String, String>,
}

pub(crate) fn default_curator_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".curator"))
        .unwrap_or_else(|| PathBuf::from(".curator"))
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().ok_or_else(|| {
        AuthError::Io(format!("Session path {} has no file name", path.display()))
    })?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = path.with_file_name(format!(
        ".{}.tmp-{}-{nonce}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}
