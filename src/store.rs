use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const STORE_ENV: &str = "BOOKQUEST_STORE";
pub const DEFAULT_STORE_FILE: &str = "bookquest.json";

/// Keys under which the catalog persists its parts.
pub mod keys {
    pub const BOOKS: &str = "bq:books";
    pub const OWNED: &str = "bq:owned";
    pub const READ: &str = "bq:read";
    /// Values are `saga::series` keys.
    pub const COLLAPSED_SERIES: &str = "bq:collapsedSeries";
    pub const COLLAPSED_SAGAS: &str = "bq:collapsedSagas";
    pub const ACHIEVEMENTS_UNLOCKED: &str = "bq:achievementsUnlocked";
}

/// Flat string-keyed JSON storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> anyhow::Result<()>;

    fn contains(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Reads `key`, returning `fallback` when it is missing or does not decode.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    fallback: T,
) -> anyhow::Result<T> {
    let Some(value) = store.get(key)? else {
        return Ok(fallback);
    };
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(decoded),
        Err(err) => {
            tracing::warn!(key, %err, "stored value does not decode; using fallback");
            Ok(fallback)
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let value = serde_json::to_value(value).with_context(|| format!("serialize {key}"))?;
    store.set(key, value)
}

/// Store path from the command line, then `BOOKQUEST_STORE`, then the
/// current directory.
pub fn resolve_store_path(cli_value: Option<&str>) -> PathBuf {
    if let Some(path) = cli_value {
        return PathBuf::from(path);
    }
    match std::env::var(STORE_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_STORE_FILE),
    }
}

/// A single JSON object file holding every key.
///
/// Each `set` rewrites the file through a temporary sibling and a rename.
#[derive(Debug, Clone)]
pub struct LocalFsStore {
    path: PathBuf,
}

impl LocalFsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, Value>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("read store: {}", self.path.display()));
            }
        };
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse store: {}", self.path.display()))
    }
}

impl KeyValueStore for LocalFsStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), value);
        write_json_atomic(&self.path, &entries)
    }
}

/// In-process store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.entries.borrow_mut().insert(key.to_owned(), value);
        Ok(())
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store dir: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize store")?;
    std::fs::write(&tmp_path, &data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
