//! Keyed durable storage and the best-effort JSON store built on top of it.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid storage key `{0}`")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A flat namespace of string documents, one per key.
pub trait KeyValueStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    documents: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.documents.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.documents.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.documents.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.documents.keys().cloned().collect())
    }
}

/// Stores each key as `<root>/<key>.json`.
#[derive(Clone, Debug)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{DOCUMENT_EXTENSION}")))
    }
}

impl KeyValueStorage for DirectoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // write-then-rename so a crash mid-write never leaves a torn document behind
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Best-effort JSON documents over a [`KeyValueStorage`].
///
/// Nothing here returns an error to the caller. Reads that fail fall back to the seed,
/// writes that fail are logged and dropped. The in-memory state is what the app renders;
/// storage is only a cache of it.
#[derive(Debug)]
pub struct Store<B> {
    backend: B,
}

impl<B: KeyValueStorage> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Read the document at `key`. If it is missing, empty, or doesn't parse as `T`,
    /// the seed is written in its place and returned.
    pub fn load<T: Serialize + DeserializeOwned>(&mut self, key: &str, seed: T) -> T {
        match self.read_document(key) {
            Ok(Some(document)) => return document,
            Ok(None) => log::info!("No stored document for {key}, writing seed data"),
            Err(e) => log::warn!("Failed to load {key}, falling back to seed data: {e}"),
        }
        self.save(key, &seed);
        seed
    }

    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.backend.write(key, &json));
        if let Err(e) = result {
            log::error!("Failed to save {key}: {e}");
        }
    }

    pub fn remove(&mut self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            log::error!("Failed to remove {key}: {e}");
        }
    }

    fn read_document<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.read(key)? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        if is_empty_document(&value) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}

/// `null` and `[]` count as "nothing stored yet".
fn is_empty_document(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    fn seed() -> Vec<Doc> {
        vec![Doc {
            name: "seed".to_string(),
            count: 1,
        }]
    }

    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn keys(&self) -> Result<Vec<String>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_missing_key_writes_seed() {
        let mut store = Store::new(MemoryStorage::new());
        let loaded = store.load("docs", seed());

        assert_eq!(loaded, seed());
        let raw = store.backend().read("docs").unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Vec<Doc>>(&raw).unwrap(), seed());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut store = Store::new(MemoryStorage::new());
        let docs = vec![
            Doc {
                name: "a".to_string(),
                count: 3,
            },
            Doc {
                name: "b".to_string(),
                count: 0,
            },
        ];
        store.save("docs", &docs);

        assert_eq!(store.load("docs", seed()), docs);
    }

    #[test]
    fn test_corrupt_document_is_replaced_with_seed() {
        let mut backend = MemoryStorage::new();
        backend.write("docs", "{not json").unwrap();
        let mut store = Store::new(backend);

        assert_eq!(store.load("docs", seed()), seed());
        // the corrupt document was overwritten, so the next load parses
        assert_eq!(store.load("docs", Vec::<Doc>::new()), seed());
    }

    #[test]
    fn test_wrong_shape_is_replaced_with_seed() {
        let mut backend = MemoryStorage::new();
        backend.write("docs", r#"{"unexpected": true}"#).unwrap();
        let mut store = Store::new(backend);

        assert_eq!(store.load("docs", seed()), seed());
    }

    #[test]
    fn test_empty_documents_fall_back_to_seed() {
        for raw in ["", "   ", "null", "[]"] {
            let mut backend = MemoryStorage::new();
            backend.write("docs", raw).unwrap();
            let mut store = Store::new(backend);
            assert_eq!(store.load("docs", seed()), seed(), "raw document {raw:?}");
        }
    }

    #[test]
    fn test_broken_backend_never_fails_the_caller() {
        let mut store = Store::new(BrokenStorage);

        assert_eq!(store.load("docs", seed()), seed());
        store.save("docs", &seed());
        store.remove("docs");
    }

    #[test]
    fn test_directory_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = DirectoryStorage::open(dir.path().join("data")).unwrap();

        assert_eq!(storage.read("devpulse_feed_v4").unwrap(), None);
        storage.write("devpulse_feed_v4", "[1,2,3]").unwrap();
        storage.write("devpulse_settings_v1", "{}").unwrap();

        assert_eq!(
            storage.read("devpulse_feed_v4").unwrap().as_deref(),
            Some("[1,2,3]")
        );
        assert_eq!(
            storage.keys().unwrap(),
            vec!["devpulse_feed_v4".to_string(), "devpulse_settings_v1".to_string()]
        );

        storage.remove("devpulse_feed_v4").unwrap();
        storage.remove("devpulse_feed_v4").unwrap();
        assert_eq!(storage.read("devpulse_feed_v4").unwrap(), None);
    }

    #[test]
    fn test_directory_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = DirectoryStorage::open(dir.path()).unwrap();

        for key in ["", "../escape", ".hidden", "a/b"] {
            assert!(matches!(
                storage.write(key, "{}"),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_store_over_directory_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![Doc {
            name: "persisted".to_string(),
            count: 42,
        }];
        {
            let mut store = Store::new(DirectoryStorage::open(dir.path()).unwrap());
            store.save("docs", &docs);
        }
        let mut reopened = Store::new(DirectoryStorage::open(dir.path()).unwrap());
        assert_eq!(reopened.load("docs", seed()), docs);
    }
}
