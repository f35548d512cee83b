use crate::consensus::keys;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A replicated key/value record. `timestamp` is a per-key version: it's assigned by the leader
/// and strictly increases for each successive publish of the same key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datum {
    pub key: String,
    pub value: String,
    pub timestamp: u64,
}

/// One entry of a beat digest: which version of a key the leader has.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DigestEntry {
    pub(crate) key: String,
    pub(crate) timestamp: u64,
}

/// DatumStore is the in-memory key -> Datum map. The consensus engine is the only writer, while
/// readers (client lookups, notifier, RPC server) can read concurrently from other tasks.
#[derive(Clone, Default)]
pub(crate) struct DatumStore {
    datums: Arc<RwLock<HashMap<String, Datum>>>,
}

impl DatumStore {
    pub(crate) fn new() -> Self {
        DatumStore::default()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Datum> {
        self.read(|datums| datums.get(key).cloned())
    }

    pub(crate) fn timestamp(&self, key: &str) -> Option<u64> {
        self.read(|datums| datums.get(key).map(|d| d.timestamp))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.read(|datums| datums.contains_key(key))
    }

    pub(crate) fn insert(&self, datum: Datum) {
        self.write(|datums| {
            datums.insert(datum.key.clone(), datum);
        })
    }

    pub(crate) fn remove(&self, key: &str) -> Option<Datum> {
        self.write(|datums| datums.remove(key))
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.read(|datums| datums.keys().cloned().collect())
    }

    pub(crate) fn len(&self) -> usize {
        self.read(|datums| datums.len())
    }

    /// Digest of every datum, with keys in their brief wire form.
    pub(crate) fn digest(&self) -> Vec<DigestEntry> {
        self.read(|datums| {
            datums
                .values()
                .map(|d| DigestEntry {
                    key: keys::brief_key(&d.key),
                    timestamp: d.timestamp,
                })
                .collect()
        })
    }

    /// Values for the requested keys. Unknown keys are skipped.
    pub(crate) fn get_many(&self, keys: &[String]) -> Vec<Datum> {
        self.read(|datums| keys.iter().filter_map(|k| datums.get(k).cloned()).collect())
    }

    // A panic while holding the lock can't leave the map half-updated (every write is a single
    // insert/remove), so poisoning is ignored.
    fn read<T>(&self, f: impl FnOnce(&HashMap<String, Datum>) -> T) -> T {
        let guard = self.datums.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut HashMap<String, Datum>) -> T) -> T {
        let mut guard = self.datums.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
