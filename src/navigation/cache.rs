use std::collections::HashMap;
use std::hash::Hash;

use crate::source::Fingerprint;

/// Bounded map whose entries are only valid for one source fingerprint
///
/// An insert under a different fingerprint drops everything, and lookups
/// under a different fingerprint miss: any change to the source voids cached
/// positions.
/// When full, the map is cleared rather than evicting individual entries.
#[derive(Debug)]
pub(crate) struct FingerprintCache<K, V> {
    fingerprint: Option<Fingerprint>,
    entries: HashMap<K, V>,
    capacity: usize,
}

impl<K: Eq + Hash, V: Clone> FingerprintCache<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            fingerprint: None,
            entries: HashMap::new(),
            capacity,
        }
    }

    pub(crate) fn get(&self, fingerprint: &Fingerprint, key: &K) -> Option<V> {
        if self.fingerprint.as_ref() != Some(fingerprint) {
            return None;
        }
        self.entries.get(key).cloned()
    }

    pub(crate) fn insert(&mut self, fingerprint: Fingerprint, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.fingerprint != Some(fingerprint) {
            self.entries.clear();
            self.fingerprint = Some(fingerprint);
        }
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries.insert(key, value);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
