/// Trait for entries stored in the radix heap.
///
/// The queue is monotonic: entries are dequeued in non-decreasing key order.
/// `key()` returns the unsigned key used for bucket placement.
pub trait HasKey {
    fn key(&self) -> u64;
}

/// Map a non-negative distance to an order-preserving radix key.
///
/// For non-negative IEEE-754 doubles the raw bit pattern is monotonic in the
/// value, so distances can be bucketed without quantization.
#[inline]
pub fn distance_key(distance: f64) -> u64 {
    debug_assert!(!distance.is_nan(), "NaN distance in radix heap");
    if distance <= 0.0 { 0 } else { distance.to_bits() }
}

/// 65-bucket monotonic radix-heap priority queue.
///
/// Bucket index for a key `k` is `64 - (k ^ cur_key).leading_zeros()`,
/// so bucket 0 holds entries whose key equals `cur_key`, and bucket 64
/// holds the most distant entries.
///
/// Invariant: `cur_key` only moves forward (monotonically).
#[derive(Debug, Clone)]
pub struct RadixHeapQueue<E: HasKey> {
    buckets: [Vec<E>; 65],
    cur_key: u64,
    num_enqueued: usize,
}

impl<E: HasKey> RadixHeapQueue<E> {
    pub fn new() -> Self {
        RadixHeapQueue {
            buckets: std::array::from_fn(|_| Vec::new()),
            cur_key: 0,
            num_enqueued: 0,
        }
    }

    #[inline]
    fn bucket_for(&self, key: u64) -> usize {
        let diff = key ^ self.cur_key;
        if diff == 0 {
            0
        } else {
            (64 - diff.leading_zeros()) as usize
        }
    }

    /// Enqueue an entry. Its key must be >= cur_key (monotonic invariant).
    pub fn enqueue(&mut self, entry: E) {
        debug_assert!(entry.key() >= self.cur_key, "radix heap key moved backwards");
        let bucket = self.bucket_for(entry.key());
        self.buckets[bucket].push(entry);
        self.num_enqueued += 1;
    }

    /// Dequeue the entry with the smallest key, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<E> {
        if self.num_enqueued == 0 {
            return None;
        }

        // Fast path: bucket 0 has entries at exactly cur_key.
        if let Some(entry) = self.buckets[0].pop() {
            self.num_enqueued -= 1;
            return Some(entry);
        }

        let bi = self.buckets[1..].iter().position(|b| !b.is_empty())? + 1;

        // Advance cur_key to the minimum of that bucket.
        let min_key = self.buckets[bi].iter().map(|e| e.key()).min()?;
        self.cur_key = min_key;

        // Redistribute all entries from this bucket into lower buckets.
        let entries = std::mem::take(&mut self.buckets[bi]);
        for entry in entries {
            let new_bucket = self.bucket_for(entry.key());
            debug_assert!(new_bucket < bi);
            self.buckets[new_bucket].push(entry);
        }

        self.num_enqueued -= 1;
        self.buckets[0].pop()
    }

    /// Visit every queued entry without draining the queue. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.buckets.iter().flat_map(|b| b.iter())
    }

    #[inline]
    pub fn cur_key(&self) -> u64 {
        self.cur_key
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_enqueued == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.num_enqueued
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.num_enqueued = 0;
    }

    pub fn reset(&mut self) {
        self.clear();
        self.cur_key = 0;
    }
}

impl<E: HasKey> Default for RadixHeapQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
