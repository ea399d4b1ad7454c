//! The shared session store.
//!
//! One mutable key/value map is created per session and injected into the
//! [`Environment`](crate::env::Environment) under the reserved name
//! [`STORE_NAME`](crate::env::STORE_NAME).  It is shared by reference across
//! every script execution in that session, so scripts can stash state
//! between runs and the host can inspect it afterwards.
//!
//! [`Store`] doubles as the general shared-map value
//! ([`Value::Map`](crate::value::Value::Map)) for any host-supplied map
//! binding, such as a service object exposing [`NativeFn`] entries.
//!
//! [`NativeFn`]: crate::value::NativeFn

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::value::Value;

/// Clonable handle to a shared key/value map.
///
/// Cloning is a cheap reference-count increment; all clones view the same
/// underlying entries.  The internal mutex only makes the handle safe to
/// pass across the host/evaluator seam — the console itself is strictly
/// single-threaded.
#[derive(Clone, Default)]
pub struct Store {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        // A poisoned lock only means a panic elsewhere while holding it;
        // the map itself is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace an entry.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Clone out the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Remove an entry, returning it if it existed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of all entries (unordered).
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Replace the whole contents with `entries`.
    ///
    /// Used by evaluators that hand the script a converted copy of the map
    /// and write the result back after the run.
    pub fn replace_all(&self, entries: HashMap<String, Value>) {
        *self.lock() = entries;
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// `true` when `other` is a handle to the same underlying map.
    pub fn same_as(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store({} entries)", self.len())
    }
}

impl PartialEq for Store {
    /// Identity comparison: two handles are equal when they share the same
    /// underlying map, matching the by-reference sharing semantics.
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
