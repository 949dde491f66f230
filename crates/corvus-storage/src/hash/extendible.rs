//! Extendible hash table implementation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

/// Stable hash of a key; the directory routes on its low bits.
fn hash_of<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// A bounded-capacity bucket holding key/value pairs.
///
/// Every key in a bucket hashes to the bucket's discriminant on its low
/// `depth` bits. Lookups are linear scans; capacities are small.
struct Bucket<K, V> {
    depth: usize,
    items: Vec<(K, V)>,
}

impl<K: Eq, V> Bucket<K, V> {
    fn new(depth: usize, capacity: usize) -> Self {
        Self {
            depth,
            items: Vec::with_capacity(capacity),
        }
    }

    fn find(&self, key: &K) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

struct TableState<K, V> {
    /// Number of low hash bits used to index the directory.
    global_depth: usize,
    /// Directory of `2^global_depth` slots, each an index into `buckets`.
    dir: Vec<usize>,
    /// Bucket arena. A split retires the one-side entries of a bucket in
    /// place and appends a fresh bucket, so slots never dangle.
    buckets: Vec<Bucket<K, V>>,
    /// Maximum entries per bucket before it splits.
    bucket_capacity: usize,
    /// Number of distinct buckets reachable from the directory.
    num_buckets: usize,
    /// Total number of stored entries.
    len: usize,
}

impl<K: Hash + Eq + Clone, V: Copy> TableState<K, V> {
    /// Directory slot for a key under the current global depth.
    fn dir_index(&self, key: &K) -> usize {
        let mask = (1usize << self.global_depth) - 1;
        (hash_of(key) as usize) & mask
    }

    /// Duplicates every directory entry pointwise, adding one routing bit.
    fn double_directory(&mut self) {
        self.dir.extend_from_within(..);
        self.global_depth += 1;
    }

    /// Splits the bucket at `bucket_idx`, redistributing its entries by
    /// the next hash bit and redirecting the directory slots that pointed
    /// at it. The caller has already ensured `local depth < global depth`.
    fn split_bucket(&mut self, bucket_idx: usize) {
        let local_depth = self.buckets[bucket_idx].depth;
        debug_assert!(local_depth < self.global_depth);

        let one_idx = self.buckets.len();
        self.buckets
            .push(Bucket::new(local_depth + 1, self.bucket_capacity));
        self.buckets[bucket_idx].depth = local_depth + 1;

        // Partition the old entries by bit `local_depth` of their hash.
        let old_items = std::mem::take(&mut self.buckets[bucket_idx].items);
        for (key, value) in old_items {
            let target = if (hash_of(&key) >> local_depth) & 1 == 1 {
                one_idx
            } else {
                bucket_idx
            };
            self.buckets[target].items.push((key, value));
        }

        // Slots that shared the old bucket agree on the low `local_depth`
        // bits; bit `local_depth` of the slot index picks the side.
        for slot in 0..self.dir.len() {
            if self.dir[slot] == bucket_idx && (slot >> local_depth) & 1 == 1 {
                self.dir[slot] = one_idx;
            }
        }

        self.num_buckets += 1;
    }
}

/// An extendible hash table mapping `K` to `V`.
///
/// The table starts with a single bucket at global depth 0 and grows by
/// local bucket splits; duplicate inserts update the existing value in
/// place. Shrinking is not supported. All operations take the table's
/// internal latch, so a shared reference is enough to mutate it.
pub struct ExtendibleHashTable<K, V> {
    state: Mutex<TableState<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Copy> ExtendibleHashTable<K, V> {
    /// Creates an empty table whose buckets split once they hold more
    /// than `bucket_capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_capacity` is zero.
    pub fn new(bucket_capacity: usize) -> Self {
        assert!(bucket_capacity > 0, "bucket capacity must be positive");
        Self {
            state: Mutex::new(TableState {
                global_depth: 0,
                dir: vec![0],
                buckets: vec![Bucket::new(0, bucket_capacity)],
                bucket_capacity,
                num_buckets: 1,
                len: 0,
            }),
        }
    }

    /// Inserts a key/value pair, updating the value in place if the key
    /// is already present.
    pub fn insert(&self, key: K, value: V) {
        let mut state = self.state.lock();
        // A single split may not make room when every key agrees on the
        // new bit as well, so keep splitting until the insert lands. The
        // loop terminates because each split raises a local depth.
        loop {
            let slot = state.dir_index(&key);
            let bucket_idx = state.dir[slot];
            let capacity = state.bucket_capacity;
            let bucket = &mut state.buckets[bucket_idx];

            if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = value;
                return;
            }
            if bucket.items.len() < capacity {
                bucket.items.push((key, value));
                state.len += 1;
                return;
            }

            let local_depth = bucket.depth;
            if local_depth == state.global_depth {
                state.double_directory();
            }
            state.split_bucket(bucket_idx);
        }
    }

    /// Looks up the value stored under `key`.
    pub fn find(&self, key: &K) -> Option<V> {
        let state = self.state.lock();
        let slot = state.dir_index(key);
        state.buckets[state.dir[slot]].find(key).copied()
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&self, key: &K) -> bool {
        let mut state = self.state.lock();
        let slot = state.dir_index(key);
        let bucket_idx = state.dir[slot];
        let bucket = &mut state.buckets[bucket_idx];
        match bucket.items.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                bucket.items.remove(pos);
                state.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Number of low hash bits currently used to index the directory.
    pub fn global_depth(&self) -> usize {
        self.state.lock().global_depth
    }

    /// Local depth of the bucket behind the given directory slot.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is outside the directory.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let state = self.state.lock();
        state.buckets[state.dir[dir_index]].depth
    }

    /// Number of distinct buckets reachable from the directory.
    pub fn num_buckets(&self) -> usize {
        self.state.lock().num_buckets
    }

    /// Number of entries stored in the table.
    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> std::fmt::Debug for ExtendibleHashTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &state.global_depth)
            .field("num_buckets", &state.num_buckets)
            .field("len", &state.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_find_remove() {
        let table = ExtendibleHashTable::new(4);
        assert!(table.is_empty());

        table.insert(1u64, 10u64);
        table.insert(2, 20);
        table.insert(3, 30);

        assert_eq!(table.find(&1), Some(10));
        assert_eq!(table.find(&2), Some(20));
        assert_eq!(table.find(&3), Some(30));
        assert_eq!(table.find(&4), None);
        assert_eq!(table.len(), 3);

        assert!(table.remove(&2));
        assert!(!table.remove(&2));
        assert_eq!(table.find(&2), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_insert_updates_in_place() {
        let table = ExtendibleHashTable::new(2);
        table.insert(7u64, 1u64);
        table.insert(7, 2);
        assert_eq!(table.find(&7), Some(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_directory_split() {
        // Three keys that agree on the low hash bit overflow a bucket of
        // capacity 2 and force the directory past depth 0.
        let table = ExtendibleHashTable::new(2);
        let keys: Vec<u64> = (0u64..)
            .filter(|k| hash_of(k) & 1 == 1)
            .take(3)
            .collect();

        assert_eq!(table.global_depth(), 0);
        for (i, &k) in keys.iter().enumerate() {
            table.insert(k, i as u64);
        }

        assert!(table.global_depth() >= 1);
        assert!(table.num_buckets() >= 2);
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(table.find(&k), Some(i as u64));
        }
    }

    #[test]
    fn test_many_inserts_stay_findable() {
        let table = ExtendibleHashTable::new(4);
        for k in 0u64..512 {
            table.insert(k, k * 2);
        }
        assert_eq!(table.len(), 512);
        for k in 0u64..512 {
            assert_eq!(table.find(&k), Some(k * 2));
        }

        // Directory size stays a power of two and local depths never
        // exceed the global depth.
        let depth = table.global_depth();
        for slot in 0..(1usize << depth) {
            assert!(table.local_depth(slot) <= depth);
        }
    }

    #[test]
    fn test_remove_then_reinsert() {
        let table = ExtendibleHashTable::new(2);
        for k in 0u64..64 {
            table.insert(k, k);
        }
        for k in 0u64..64 {
            assert!(table.remove(&k));
        }
        assert!(table.is_empty());
        for k in 0u64..64 {
            table.insert(k, k + 1);
        }
        for k in 0u64..64 {
            assert_eq!(table.find(&k), Some(k + 1));
        }
    }

    #[test]
    fn test_routing_matches_low_bits() {
        // Any two keys that agree on the low `global_depth` bits of
        // their hash must be served by the same bucket, so a lookup for
        // one never misses because of the other's split history.
        let table = ExtendibleHashTable::new(2);
        for k in 0u64..128 {
            table.insert(k, k);
        }
        let depth = table.global_depth();
        let mask = (1u64 << depth) - 1;
        for k in 0u64..128 {
            let slot = (hash_of(&k) & mask) as usize;
            assert!(table.local_depth(slot) <= depth);
            assert_eq!(table.find(&k), Some(k));
        }
    }
}
