use bincode::{Decode, Encode};

use crate::errors::{Result, TraghettoError};
use crate::utils::SerializableHashMap;

const FNV_OFFSET_32: u32 = 0x811c_9dc5;
const FNV_PRIME_32: u32 = 16_777_619;

/// Seeded 32-bit FNV-1a. A zero seed selects the standard offset basis, so
/// `hash(0, key)` is plain FNV-1a and nonzero seeds give independent hash
/// functions for displacement search.
#[inline]
fn hash(seed: u32, key: &[u8]) -> u32 {
    let mut h = if seed == 0 { FNV_OFFSET_32 } else { seed };
    for &b in key {
        h ^= u32::from(b);
        h = h.wrapping_mul(FNV_PRIME_32);
    }
    h
}

/// 64-bit FNV-1a, used as a membership fingerprint per slot. The perfect
/// hash alone maps every string *somewhere*; the fingerprint is what lets
/// `lookup` refuse keys that were not in the build set.
#[inline]
fn fingerprint(key: &[u8]) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64;
    for &b in key {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

/// Immutable term-to-id map backed by a minimal perfect hash table.
///
/// Keys are inserted while the store is open, then [`VocabularyStore::build`]
/// computes the two-array table and freezes the key set: one displacement
/// slot and one value slot per key, O(1) lookup, no further insertions.
///
/// Construction uses bucket displacement: every key falls into a bucket via
/// `hash(0, key)`; buckets are placed largest first, searching seeds until
/// all keys of a bucket land on distinct free slots. Singleton buckets skip
/// the search and record the slot directly as a negative sentinel.
///
/// # Examples
///
/// ```
/// use traghetto::VocabularyStore;
///
/// let mut store = VocabularyStore::new();
/// store.insert("dog", 7).unwrap();
/// store.insert("cat", 21).unwrap();
/// store.build().unwrap();
///
/// assert_eq!(Some(7), store.lookup("dog"));
/// assert_eq!(None, store.lookup("emu"));
/// ```
#[derive(Debug, Clone, Default, Encode, Decode)]
pub struct VocabularyStore {
    /// Displacement seeds per bucket; `-slot - 1` for singleton buckets.
    displacements: Vec<i32>,
    /// Term id per slot.
    values: Vec<u32>,
    /// Membership fingerprint per slot.
    fingerprints: Vec<u64>,
    /// Keys accumulated before `build`; drained by it.
    pending: SerializableHashMap<String, u32>,
    frozen: bool,
}

impl VocabularyStore {
    /// Creates an empty, open store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key with its term id.
    ///
    /// Re-inserting a key overwrites the previous id.
    ///
    /// # Errors
    ///
    /// [`TraghettoError::FrozenVocab`] if the store has already been built.
    pub fn insert<S>(&mut self, key: S, term_id: u32) -> Result<()>
    where
        S: Into<String>,
    {
        if self.frozen {
            return Err(TraghettoError::frozen_vocab(
                "the key set is finalized; insertions are not accepted",
            ));
        }
        self.pending.insert(key.into(), term_id);
        Ok(())
    }

    /// Number of keys in the store.
    pub fn len(&self) -> usize {
        if self.frozen {
            self.values.len()
        } else {
            self.pending.len()
        }
    }

    /// Checks if the store contains no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the perfect hash table over the inserted keys and freezes the
    /// key set.
    ///
    /// # Errors
    ///
    /// [`TraghettoError::FrozenVocab`] if the store has already been built.
    pub fn build(&mut self) -> Result<()> {
        if self.frozen {
            return Err(TraghettoError::frozen_vocab(
                "the table has already been built",
            ));
        }
        // Map iteration order is unspecified; sort so equal key sets always
        // produce the same table layout and model bytes.
        let mut pending: Vec<(String, u32)> =
            core::mem::take(&mut self.pending).0.into_iter().collect();
        pending.sort_unstable();
        let size = pending.len();
        self.displacements = vec![0; size];
        self.values = vec![0; size];
        self.fingerprints = vec![0; size];
        self.frozen = true;
        if size == 0 {
            return Ok(());
        }

        let mut buckets: Vec<Vec<usize>> = vec![vec![]; size];
        for (i, (key, _)) in pending.iter().enumerate() {
            buckets[hash(0, key.as_bytes()) as usize % size].push(i);
        }
        let mut order: Vec<usize> = (0..size).collect();
        order.sort_by_key(|&b| core::cmp::Reverse(buckets[b].len()));

        let mut occupied = vec![false; size];
        let mut trial = Vec::new();
        let mut next_free = 0;
        for &b in &order {
            let bucket = &buckets[b];
            match bucket.len() {
                0 => break,
                1 => {
                    while occupied[next_free] {
                        next_free += 1;
                    }
                    let (key, term_id) = &pending[bucket[0]];
                    occupied[next_free] = true;
                    self.displacements[b] = -(next_free as i32) - 1;
                    self.values[next_free] = *term_id;
                    self.fingerprints[next_free] = fingerprint(key.as_bytes());
                }
                _ => {
                    let mut seed = 1u32;
                    loop {
                        trial.clear();
                        let mut ok = true;
                        for &i in bucket {
                            let slot = hash(seed, pending[i].0.as_bytes()) as usize % size;
                            if occupied[slot] || trial.contains(&slot) {
                                ok = false;
                                break;
                            }
                            trial.push(slot);
                        }
                        if ok {
                            for (&i, &slot) in bucket.iter().zip(&trial) {
                                let (key, term_id) = &pending[i];
                                occupied[slot] = true;
                                self.values[slot] = *term_id;
                                self.fingerprints[slot] = fingerprint(key.as_bytes());
                            }
                            self.displacements[b] = seed as i32;
                            break;
                        }
                        seed += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Looks up the term id of a key. O(1) worst case.
    ///
    /// # Returns
    ///
    /// `None` before the table is built and for keys absent from the build
    /// set.
    pub fn lookup(&self, key: &str) -> Option<u32> {
        if !self.frozen || self.values.is_empty() {
            return None;
        }
        let key = key.as_bytes();
        let size = self.values.len();
        let d = self.displacements[hash(0, key) as usize % size];
        let slot = if d < 0 {
            (-d - 1) as usize
        } else {
            hash(d as u32, key) as usize % size
        };
        (self.fingerprints[slot] == fingerprint(key)).then(|| self.values[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_store(keys: &[&str]) -> VocabularyStore {
        let mut store = VocabularyStore::new();
        for (i, key) in keys.iter().enumerate() {
            store.insert(*key, i as u32).unwrap();
        }
        store.build().unwrap();
        store
    }

    #[test]
    fn test_empty_store() {
        let mut store = VocabularyStore::new();
        store.build().unwrap();
        assert!(store.is_empty());
        assert_eq!(None, store.lookup("anything"));
    }

    #[test]
    fn test_lookup_before_build() {
        let mut store = VocabularyStore::new();
        store.insert("dog", 0).unwrap();
        assert_eq!(None, store.lookup("dog"));
    }

    #[test]
    fn test_round_trip() {
        let keys = ["the", "dog", "is", "beautiful", "a", "an", "cat", "run"];
        let store = build_store(&keys);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(Some(i as u32), store.lookup(key), "key {key:?}");
        }
    }

    #[test]
    fn test_round_trip_large() {
        let keys: Vec<String> = (0..5000).map(|i| format!("term-{i}")).collect();
        let mut store = VocabularyStore::new();
        for (i, key) in keys.iter().enumerate() {
            store.insert(key.clone(), i as u32).unwrap();
        }
        store.build().unwrap();
        assert_eq!(5000, store.len());
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(Some(i as u32), store.lookup(key));
        }
    }

    #[test]
    fn test_no_false_positives() {
        let keys: Vec<String> = (0..1000).map(|i| format!("term-{i}")).collect();
        let mut store = VocabularyStore::new();
        for (i, key) in keys.iter().enumerate() {
            store.insert(key.clone(), i as u32).unwrap();
        }
        store.build().unwrap();
        for i in 0..10000 {
            assert_eq!(None, store.lookup(&format!("unseen-{i}")));
        }
    }

    #[test]
    fn test_duplicate_insert_overwrites() {
        let mut store = VocabularyStore::new();
        store.insert("dog", 1).unwrap();
        store.insert("dog", 2).unwrap();
        store.build().unwrap();
        assert_eq!(1, store.len());
        assert_eq!(Some(2), store.lookup("dog"));
    }

    #[test]
    fn test_duplicate_inserts_deduplicate_large() {
        let mut store = VocabularyStore::new();
        for i in 0..2000u32 {
            store.insert(format!("term-{i}"), i).unwrap();
        }
        for i in 0..2000u32 {
            store.insert(format!("term-{i}"), i + 2000).unwrap();
        }
        assert_eq!(2000, store.len());
        store.build().unwrap();
        assert_eq!(2000, store.len());
        for i in 0..2000u32 {
            assert_eq!(Some(i + 2000), store.lookup(&format!("term-{i}")));
        }
    }

    #[test]
    fn test_insert_after_build_fails() {
        let mut store = build_store(&["dog"]);
        let e = store.insert("cat", 1);
        assert!(e.is_err());
        assert_eq!(
            "FrozenVocabError: the key set is finalized; insertions are not accepted",
            &e.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_rebuild_fails() {
        let mut store = build_store(&["dog"]);
        assert!(store.build().is_err());
    }
}
