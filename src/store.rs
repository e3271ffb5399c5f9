//! Core store type, builder, and public API.

use crate::coalesce::{WriteCoalescer, WriteReceipt};
use crate::error::{Error, Result};
use crate::persist;
use crate::serializer::{JsonSerializer, Serializer};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// In-memory mapping plus the loaded flag that gates every operation on it.
struct StoreState<V> {
    mapping: HashMap<String, V>,
    loaded: bool,
}

/// Single-file JSON key-value store with background persistence.
///
/// The whole mapping lives in memory and is mirrored to one JSON file.
/// Mutations apply to memory synchronously and return a [`WriteReceipt`] for
/// the asynchronous disk write; rapid mutations coalesce so at most one write
/// is in flight and at most one more is queued, yet the file always converges
/// to the latest state.
///
/// Generic over the value type `V` (anything serde can put in a JSON object
/// value position), defaulting to [`serde_json::Value`] for schemaless use.
///
/// ```rust,no_run
/// use json_stash::JsonStash;
/// use serde_json::json;
///
/// let db = JsonStash::open("config.json").unwrap();
/// db.insert("greeting", json!("hello")).unwrap().wait().unwrap();
/// assert_eq!(db.get("greeting").unwrap(), Some(json!("hello")));
/// ```
pub struct JsonStash<V = Value> {
    state: RwLock<StoreState<V>>,
    path: PathBuf,
    serializer: JsonSerializer,
    coalescer: Option<WriteCoalescer>,
    read_only: bool,
}

impl<V> JsonStash<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// Open the store at `path`, creating the file (containing `{}`) if it
    /// does not exist, and load it into memory before returning.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Open without write access. Shorthand for
    /// `builder(path).read_only(true).build()`.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).read_only(true).build()
    }

    /// Begin configuring a store; finish with
    /// [`.build()`](JsonStashBuilder::build).
    pub fn builder(path: impl AsRef<Path>) -> JsonStashBuilder<V> {
        JsonStashBuilder::new(path)
    }

    // ---- reads ----

    /// Fetch the value stored under `key`, `None` when the key is absent.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        Ok(self.read_state()?.mapping.get(key).cloned())
    }

    /// `true` if the key exists, without cloning the value.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.read_state()?.mapping.contains_key(key))
    }

    /// Number of entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_state()?.mapping.len())
    }

    /// `true` while the mapping holds nothing.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Copy out every key-value pair as of this instant.
    pub fn entries(&self) -> Result<Vec<(String, V)>> {
        let state = self.read_state()?;
        Ok(state
            .mapping
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Copy out every key.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_state()?.mapping.keys().cloned().collect())
    }

    /// Copy out every value.
    pub fn values(&self) -> Result<Vec<V>> {
        Ok(self.read_state()?.mapping.values().cloned().collect())
    }

    // ---- writes ----

    /// Insert a new key. Fails with [`Error::KeyExists`] if the key is
    /// already present; nothing is mutated and no write is requested in that
    /// case. Use [`upsert`](Self::upsert) to overwrite.
    pub fn insert(&self, key: impl Into<String>, value: V) -> Result<WriteReceipt> {
        let key = key.into();
        let mut state = self.write_state()?;
        if state.mapping.contains_key(&key) {
            return Err(Error::KeyExists(key));
        }
        state.mapping.insert(key, value);
        self.persist(&state)
    }

    /// Insert or replace the value for `key`. Creates the key if absent.
    pub fn upsert(&self, key: impl Into<String>, value: V) -> Result<WriteReceipt> {
        let mut state = self.write_state()?;
        state.mapping.insert(key.into(), value);
        self.persist(&state)
    }

    /// Apply a batch of pairs in one pass, replacing existing keys, then
    /// request a single write for the combined result: far less write
    /// traffic than one call per entry.
    pub fn extend<I, S>(&self, pairs: I) -> Result<WriteReceipt>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
    {
        let mut state = self.write_state()?;
        for (key, value) in pairs {
            state.mapping.insert(key.into(), value);
        }
        self.persist(&state)
    }

    /// Remove `key` if present (absent keys are not an error), then request
    /// persistence of the mapping.
    pub fn remove(&self, key: &str) -> Result<WriteReceipt> {
        let mut state = self.write_state()?;
        state.mapping.remove(key);
        self.persist(&state)
    }

    /// Empty the mapping in one step and persist the empty object.
    pub fn clear(&self) -> Result<WriteReceipt> {
        let mut state = self.write_state()?;
        state.mapping.clear();
        self.persist(&state)
    }

    // ---- reload ----

    /// Throw away the in-memory mapping and re-read the backing file.
    ///
    /// **This is lossy by design.** Any mutation whose write has not yet
    /// finished is discarded: the queued snapshot (if one exists) is dropped
    /// and its receipts resolve with [`Error::Discarded`], and a write
    /// already in flight is not waited for, so it can land after the re-read
    /// and leave the file newer than memory. Call this only when you know
    /// the store is quiet ([`is_synced`](Self::is_synced) tells you) or when
    /// losing unflushed mutations is acceptable.
    ///
    /// While the reload runs, mutations are locked out and the store counts
    /// as not loaded; if the re-read fails the store stays unusable
    /// (every mapping call returns [`Error::NotLoaded`]) until a later
    /// `force_reload` succeeds.
    pub fn force_reload(&self) -> Result<()> {
        let mut state = self.state.write();
        state.loaded = false;
        state.mapping = HashMap::new();
        if let Some(coalescer) = &self.coalescer {
            let dropped = coalescer.discard_queued();
            if dropped > 0 {
                tracing::warn!(
                    dropped,
                    "reload discarded a queued snapshot before it reached disk"
                );
            }
        }
        state.mapping = persist::load(&self.path, &self.serializer)?;
        state.loaded = true;
        tracing::debug!(
            path = %self.path.display(),
            entries = state.mapping.len(),
            "reloaded backing file"
        );
        Ok(())
    }

    // ---- diagnostics ----

    /// The file this store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` once a load has succeeded and no reload is in progress.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    /// `true` if the store was opened read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// `true` when every requested write has reached disk: no write in
    /// flight and no snapshot queued.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.coalescer.as_ref().map_or(true, WriteCoalescer::is_idle)
    }

    /// Number of disk writes started so far. Under bursts this stays below
    /// the number of mutations; the difference is coalescing at work.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.coalescer.as_ref().map_or(0, WriteCoalescer::write_count)
    }

    // ---- internal ----

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState<V>>> {
        let state = self.state.read();
        if !state.loaded {
            return Err(Error::NotLoaded);
        }
        Ok(state)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState<V>>> {
        let state = self.state.write();
        if !state.loaded {
            return Err(Error::NotLoaded);
        }
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        Ok(state)
    }

    /// Serialize the mapping and hand the snapshot to the coalescer. Called
    /// with the state lock held, so snapshots enter the queue in mutation
    /// order.
    fn persist(&self, state: &StoreState<V>) -> Result<WriteReceipt> {
        let coalescer = self.coalescer.as_ref().ok_or(Error::ReadOnly)?;
        let snapshot = self.serializer.serialize(&state.mapping)?;
        Ok(coalescer.submit(snapshot))
    }
}

impl<V> std::fmt::Debug for JsonStash<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStash")
            .field("path", &self.path)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Step-by-step construction of a [`JsonStash`].
///
/// ```rust,no_run
/// use json_stash::JsonStash;
///
/// let db: JsonStash = JsonStash::builder("db.json")
///     .pretty(true)
///     .build()
///     .unwrap();
/// ```
pub struct JsonStashBuilder<V = Value> {
    path: PathBuf,
    pretty: bool,
    read_only: bool,
    _marker: PhantomData<V>,
}

impl<V> JsonStashBuilder<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pretty: false,
            read_only: false,
            _marker: PhantomData,
        }
    }

    /// Indent the JSON on disk (default: compact, one line).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Load the file but refuse all mutations (default: writable). No writer
    /// thread is spawned, and a missing backing file is not created; it
    /// loads as an empty mapping.
    pub fn read_only(mut self, yes: bool) -> Self {
        self.read_only = yes;
        self
    }

    /// Create the backing file if needed, load it, and return the store.
    pub fn build(self) -> Result<JsonStash<V>> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("backing file path is empty".into()));
        }
        let serializer = if self.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };

        // a read-only open must not touch the disk, not even to bootstrap;
        // a missing file simply loads as an empty mapping
        if !self.read_only {
            persist::ensure_file(&self.path)?;
        }
        let mapping = persist::load(&self.path, &serializer)?;
        tracing::debug!(
            path = %self.path.display(),
            entries = mapping.len(),
            "loaded backing file"
        );

        let coalescer = if self.read_only {
            None
        } else {
            let path = self.path.clone();
            Some(WriteCoalescer::start(move |bytes| {
                persist::atomic_write(&path, bytes)
            }))
        };

        Ok(JsonStash {
            state: RwLock::new(StoreState {
                mapping,
                loaded: true,
            }),
            path: self.path,
            serializer,
            coalescer,
            read_only: self.read_only,
        })
    }
}

impl<V> std::fmt::Debug for JsonStashBuilder<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStashBuilder")
            .field("path", &self.path)
            .field("pretty", &self.pretty)
            .field("read_only", &self.read_only)
            .finish()
    }
}
