use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    StorageUnavailable,
    QuotaExceeded { limit_bytes: usize },
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::StorageUnavailable => write!(f, "session storage unavailable"),
            SessionError::QuotaExceeded { limit_bytes } => {
                write!(f, "session storage quota of {limit_bytes} bytes exceeded")
            }
            SessionError::Corrupt(msg) => write!(f, "session storage corrupt: {msg}"),
            SessionError::Io(msg) => write!(f, "session storage error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Key-value storage scoped to one browsing session (or one CLI run).
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&mut self, key: &str) -> Result<(), SessionError>;
}

/// Reads and deserializes the JSON blob under `key`.
///
/// Absent or blank values are `Ok(None)`; unparsable ones are `Corrupt`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> Result<Option<T>, SessionError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| SessionError::Corrupt(e.to_string()))
}

pub fn save_json<T: Serialize>(
    store: &mut dyn SessionStore,
    key: &str,
    value: &T,
) -> Result<(), SessionError> {
    let raw = serde_json::to_string(value).map_err(|e| SessionError::Io(e.to_string()))?;
    store.set(key, &raw)
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once the total of keys and values would exceed
    /// `quota_bytes`, like a browser storage quota.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        if let Some(limit_bytes) = self.quota_bytes {
            if self.used_bytes_without(key) + key.len() + value.len() > limit_bytes {
                return Err(SessionError::QuotaExceeded { limit_bytes });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Session store persisted as a single JSON object on disk.
///
/// Native stand-in for the browser's tab-scoped storage: the CLI keeps its
/// session in one file so a later run can rehydrate it.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(SessionError::Io(format!("read {:?}: {e}", self.path))),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| SessionError::Corrupt(e.to_string()))
    }

    fn save_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let raw =
            serde_json::to_string_pretty(entries).map_err(|e| SessionError::Io(e.to_string()))?;
        fs::write(&self.path, raw)
            .map_err(|e| SessionError::Io(format!("write {:?}: {e}", self.path)))?;
        debug!(path = ?self.path, keys = entries.len(), "session file written");
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.load_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        // A corrupt file is replaced rather than blocking every later write.
        let mut entries = self.load_all().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.save_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.load_all().unwrap_or_default();
        if entries.remove(key).is_some() {
            self.save_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{SessionError, SessionStore};

    /// Browser `window.sessionStorage`.
    #[derive(Debug, Default)]
    pub struct BrowserSessionStore;

    impl BrowserSessionStore {
        pub fn new() -> Result<Self, SessionError> {
            window_session_storage()?;
            Ok(Self)
        }
    }

    impl SessionStore for BrowserSessionStore {
        fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
            window_session_storage()?
                .get_item(key)
                .map_err(|e| SessionError::Io(format!("get_item failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
            window_session_storage()?
                .set_item(key, value)
                .map_err(|e| SessionError::Io(format!("set_item failed: {:?}", e)))
        }

        fn remove(&mut self, key: &str) -> Result<(), SessionError> {
            window_session_storage()?
                .remove_item(key)
                .map_err(|e| SessionError::Io(format!("remove_item failed: {:?}", e)))
        }
    }

    fn window_session_storage() -> Result<web_sys::Storage, SessionError> {
        let win = web_sys::window().ok_or(SessionError::StorageUnavailable)?;
        win.session_storage()
            .map_err(|e| SessionError::Io(format!("sessionStorage error: {:?}", e)))?
            .ok_or(SessionError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::BrowserSessionStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct BrowserSessionStore;

#[cfg(not(target_arch = "wasm32"))]
impl BrowserSessionStore {
    pub fn new() -> Result<Self, SessionError> {
        Err(SessionError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStore for BrowserSessionStore {
    fn get(&self, _key: &str) -> Result<Option<String>, SessionError> {
        Err(SessionError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), SessionError> {
        Err(SessionError::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<(), SessionError> {
        Err(SessionError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snap {
        level: String,
        seq: u64,
    }

    #[test]
    fn json_round_trip_in_memory() {
        let mut store = InMemorySessionStore::new();
        let snap = Snap {
            level: "state".into(),
            seq: 3,
        };
        save_json(&mut store, "k", &snap).unwrap();
        assert_eq!(load_json::<Snap>(&store, "k").unwrap(), Some(snap));
        assert_eq!(load_json::<Snap>(&store, "missing").unwrap(), None);
    }

    #[test]
    fn malformed_blob_is_corrupt() {
        let mut store = InMemorySessionStore::new();
        store.set("k", "{not json").unwrap();
        assert!(matches!(
            load_json::<Snap>(&store, "k"),
            Err(SessionError::Corrupt(_))
        ));
        store.set("k", "   ").unwrap();
        assert_eq!(load_json::<Snap>(&store, "k").unwrap(), None);
    }

    #[test]
    fn quota_rejects_oversized_writes_but_allows_overwrite() {
        let mut store = InMemorySessionStore::with_quota(10);
        store.set("k", "12345").unwrap();
        store.set("k", "123456789").unwrap();
        assert_eq!(
            store.set("k", "1234567890"),
            Err(SessionError::QuotaExceeded { limit_bytes: 10 })
        );
        assert_eq!(store.get("k").unwrap().as_deref(), Some("123456789"));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut a = FileSessionStore::new(&path);
        a.set("view", "{\"seq\":1}").unwrap();
        a.set("other", "x").unwrap();

        let mut b = FileSessionStore::new(&path);
        assert_eq!(b.get("view").unwrap().as_deref(), Some("{\"seq\":1}"));
        b.remove("view").unwrap();
        assert_eq!(a.get("view").unwrap(), None);
        assert_eq!(a.get("other").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn file_store_missing_file_is_empty_and_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = FileSessionStore::new(&path);
        assert_eq!(store.get("view").unwrap(), None);

        fs::write(&path, "[broken").unwrap();
        assert!(matches!(store.get("view"), Err(SessionError::Corrupt(_))));
        store.set("view", "1").unwrap();
        assert_eq!(store.get("view").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn browser_store_is_unavailable_natively() {
        assert_eq!(
            BrowserSessionStore::new().unwrap_err(),
            SessionError::StorageUnavailable
        );
    }
}
