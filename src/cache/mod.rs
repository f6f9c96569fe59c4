//! Kernel row cache shared by the per-class outputs of the LaRank solver
//!
//! Every class keeps its own [`KernelCache`]. A cache stores, for training
//! example `i`, a prefix of the kernel row `K(i, r2i[0]), K(i, r2i[1]), ...`
//! where `r2i` is a permutation of example ids. The solver keeps the support
//! vectors of a class in the first positions of that permutation, so the
//! prefix of length `l` is exactly what a score computation needs.
//!
//! Rows are evicted in least-recently-used order once the byte budget is
//! exceeded. The LRU list is a circular doubly-linked list stored in an
//! array; the slot at index `capacity` is the sentinel head.
//!
//! Caches that share an evaluator live in one [`KernelCachePool`] and can be
//! linked into a buddy ring. A lookup that misses in one cache checks every
//! buddy before calling the evaluator.

use crate::core::KernelEvaluator;
use log::trace;
use std::mem::size_of;
use std::sync::Arc;

/// Handle of a cache inside a [`KernelCachePool`]
pub type CacheId = usize;

const VALUE_SIZE: usize = size_of::<f64>();
const MIN_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
struct LruNode {
    prev: usize,
    next: usize,
}

impl LruNode {
    fn detached(k: usize) -> Self {
        Self { prev: k, next: k }
    }
}

/// Row cache of one class
#[derive(Debug)]
pub struct KernelCache {
    /// Number of example ids with valid bookkeeping (`r2i`, `i2r`, rows)
    capacity: usize,
    r2i: Vec<usize>,
    i2r: Vec<usize>,
    rows: Vec<Vec<f64>>,
    /// `None` until the row has been fetched once
    diag: Vec<Option<f64>>,
    /// `capacity + 1` nodes, the last one is the sentinel
    nodes: Vec<LruNode>,
    max_row_len: usize,
    cur_size: usize,
    max_size: usize,
    next_buddy: CacheId,
    prev_buddy: CacheId,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    fn new(id: CacheId, max_size: usize) -> Self {
        Self {
            capacity: 0,
            r2i: Vec::new(),
            i2r: Vec::new(),
            rows: Vec::new(),
            diag: Vec::new(),
            nodes: vec![LruNode::detached(0)],
            max_row_len: 0,
            cur_size: 0,
            max_size,
            next_buddy: id,
            prev_buddy: id,
            hits: 0,
            misses: 0,
        }
    }

    /// Number of example ids currently tracked
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently held by row buffers
    pub fn current_size(&self) -> usize {
        self.cur_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Example id occupying each row position
    pub fn r2i(&self) -> &[usize] {
        &self.r2i
    }

    /// Row position of each example id
    pub fn i2r(&self) -> &[usize] {
        &self.i2r
    }

    /// Row position of example `x`; untracked ids sit at their own index
    pub fn position(&self, x: usize) -> usize {
        if x < self.capacity {
            self.i2r[x]
        } else {
            x
        }
    }

    /// Number of cached values in the row of example `i`
    pub fn row_len(&self, i: usize) -> usize {
        self.rows.get(i).map_or(0, Vec::len)
    }

    fn head(&self) -> usize {
        self.capacity
    }

    /// Grow the bookkeeping so that ids below `n` are valid
    fn ensure_capacity(&mut self, n: usize) {
        if n <= self.capacity {
            return;
        }
        let old = self.capacity;
        let mut new = MIN_CAPACITY.max(old);
        while new < n {
            new += new;
        }

        let sentinel = self.nodes[old];
        self.nodes.truncate(old);
        self.r2i.extend(old..new);
        self.i2r.extend(old..new);
        self.rows.resize_with(new, Vec::new);
        self.diag.resize(new, None);
        self.nodes.extend((old..new).map(LruNode::detached));
        self.nodes.push(sentinel);

        // the sentinel moved from `old` to `new`
        if sentinel.next == old {
            self.nodes[new] = LruNode::detached(new);
        } else {
            self.nodes[sentinel.prev].next = new;
            self.nodes[sentinel.next].prev = new;
        }
        self.capacity = new;
    }

    fn unlink(&mut self, k: usize) {
        let LruNode { prev, next } = self.nodes[k];
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[k] = LruNode::detached(k);
    }

    fn link_front(&mut self, k: usize) {
        let head = self.head();
        let first = self.nodes[head].next;
        self.nodes[k] = LruNode {
            prev: head,
            next: first,
        };
        self.nodes[head].next = k;
        self.nodes[first].prev = k;
    }

    /// Shorten the row of `k` to `len` values, releasing the memory
    fn truncate(&mut self, k: usize, len: usize) {
        let old_len = self.rows[k].len();
        if len < old_len {
            self.rows[k].truncate(len);
            self.rows[k].shrink_to_fit();
            if len == 0 {
                self.unlink(k);
            }
            self.cur_size -= (old_len - len) * VALUE_SIZE;
        }
    }

    /// Drop rows from the LRU end until the budget holds
    ///
    /// The most recently used row is never dropped.
    fn purge(&mut self) {
        if self.cur_size <= self.max_size {
            return;
        }
        let head = self.head();
        let mut k = self.nodes[head].prev;
        let mut dropped = 0usize;
        while self.cur_size > self.max_size && k != self.nodes[head].next {
            let prev = self.nodes[k].prev;
            if !self.rows[k].is_empty() {
                dropped += 1;
            }
            self.truncate(k, 0);
            k = prev;
        }
        trace!(
            "kernel cache purge dropped {} rows, {} of {} bytes in use",
            dropped,
            self.cur_size,
            self.max_size
        );
    }

    fn extend_row(&mut self, k: usize, values: Vec<f64>) {
        self.cur_size += values.len() * VALUE_SIZE;
        self.rows[k].extend(values);
        self.max_row_len = self.max_row_len.max(self.rows[k].len());
    }

    /// Value of `K(i, j)` if this cache holds it
    fn lookup(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.capacity || j >= self.capacity {
            return None;
        }
        if let Some(&value) = self.rows[i].get(self.i2r[j]) {
            return Some(value);
        }
        if i == j {
            if let Some(value) = self.diag[i] {
                return Some(value);
            }
        }
        self.rows[j].get(self.i2r[i]).copied()
    }

    /// Exchange the row positions `r1` and `r2`, currently held by `i1` and `i2`
    ///
    /// Every cached row that covers one of the two positions is patched in
    /// place. When the replacement value is not available anywhere in this
    /// cache the row is cut before the stale position instead.
    fn swap(&mut self, i1: usize, i2: usize, r1: usize, r2: usize) {
        if r1 < self.max_row_len || r2 < self.max_row_len {
            let head = self.head();
            let mut longest = 0;
            let mut k = self.nodes[head].next;
            while k != head {
                let next = self.nodes[k].next;
                let n = self.rows[k].len();
                let rr = self.i2r[k];
                if r1 < n {
                    if r2 < n {
                        self.rows[k].swap(r1, r2);
                    } else {
                        // position r1 is about to hold i2
                        let replacement = if rr == r2 {
                            self.diag[k]
                        } else if rr != r1 {
                            self.rows[i2].get(rr).copied()
                        } else {
                            None
                        };
                        match replacement {
                            Some(value) => self.rows[k][r1] = value,
                            None => self.truncate(k, r1),
                        }
                    }
                } else if r2 < n {
                    // position r2 is about to hold i1
                    let replacement = if rr == r1 {
                        self.diag[k]
                    } else if rr != r2 {
                        self.rows[i1].get(rr).copied()
                    } else {
                        None
                    };
                    match replacement {
                        Some(value) => self.rows[k][r2] = value,
                        None => self.truncate(k, r2),
                    }
                }
                longest = longest.max(self.rows[k].len());
                k = next;
            }
            self.max_row_len = longest;
        }
        self.r2i[r1] = i2;
        self.r2i[r2] = i1;
        self.i2r[i1] = r2;
        self.i2r[i2] = r1;
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Queries answered from this cache or one of its buddies
    pub hits: u64,
    /// Queries that had to call the kernel evaluator
    pub misses: u64,
    /// Rows currently holding values
    pub rows: usize,
    pub current_size: usize,
    pub max_size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Arena of kernel caches bound to one kernel evaluator
///
/// The pool owns every cache. Buddy links are ids into the pool, so
/// destroying a cache only unlinks it from its ring.
pub struct KernelCachePool {
    evaluator: Arc<dyn KernelEvaluator>,
    caches: Vec<Option<KernelCache>>,
    free: Vec<CacheId>,
}

impl KernelCachePool {
    pub fn new(evaluator: Arc<dyn KernelEvaluator>) -> Self {
        Self {
            evaluator,
            caches: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn evaluator(&self) -> &Arc<dyn KernelEvaluator> {
        &self.evaluator
    }

    /// Number of live caches
    pub fn len(&self) -> usize {
        self.caches.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create an empty cache with a budget of `max_size` bytes
    pub fn create(&mut self, max_size: usize) -> CacheId {
        match self.free.pop() {
            Some(id) => {
                self.caches[id] = Some(KernelCache::new(id, max_size));
                id
            }
            None => {
                let id = self.caches.len();
                self.caches.push(Some(KernelCache::new(id, max_size)));
                id
            }
        }
    }

    /// Release a cache and unlink it from its buddy ring
    pub fn destroy(&mut self, id: CacheId) {
        let (prev, next) = {
            let cache = self.cache(id);
            (cache.prev_buddy, cache.next_buddy)
        };
        self.cache_mut(prev).next_buddy = next;
        self.cache_mut(next).prev_buddy = prev;
        self.caches[id] = None;
        self.free.push(id);
    }

    /// Drop every cache
    pub fn clear(&mut self) {
        self.caches.clear();
        self.free.clear();
    }

    pub fn cache(&self, id: CacheId) -> &KernelCache {
        match self.caches.get(id) {
            Some(Some(cache)) => cache,
            _ => panic!("kernel cache {id} does not exist"),
        }
    }

    fn cache_mut(&mut self, id: CacheId) -> &mut KernelCache {
        match self.caches.get_mut(id) {
            Some(Some(cache)) => cache,
            _ => panic!("kernel cache {id} does not exist"),
        }
    }

    /// Splice the ring of `buddy` into the ring of `id`
    pub fn set_buddy(&mut self, id: CacheId, buddy: CacheId) {
        if self.buddies(id).contains(&buddy) {
            return;
        }
        let self_last = self.cache(id).prev_buddy;
        let buddy_last = self.cache(buddy).prev_buddy;
        self.cache_mut(self_last).next_buddy = buddy;
        self.cache_mut(buddy).prev_buddy = self_last;
        self.cache_mut(buddy_last).next_buddy = id;
        self.cache_mut(id).prev_buddy = buddy_last;
    }

    /// Members of the buddy ring of `id`, starting with `id`
    pub fn buddies(&self, id: CacheId) -> Vec<CacheId> {
        let mut ring = vec![id];
        let mut cur = self.cache(id).next_buddy;
        while cur != id {
            ring.push(cur);
            cur = self.cache(cur).next_buddy;
        }
        ring
    }

    /// Change the budget of a cache and purge right away
    pub fn set_max_size(&mut self, id: CacheId, max_size: usize) {
        let cache = self.cache_mut(id);
        cache.max_size = max_size;
        cache.purge();
    }

    /// Look for `K(i, j)` in the buddies of `id`, then in `id` itself
    fn lookup(&self, id: CacheId, i: usize, j: usize) -> Option<f64> {
        let mut cur = self.cache(id).next_buddy;
        loop {
            let cache = self.cache(cur);
            if let Some(value) = cache.lookup(i, j) {
                return Some(value);
            }
            if cur == id {
                return None;
            }
            cur = cache.next_buddy;
        }
    }

    /// Kernel value `K(i, j)`, from any cache of the ring or from the evaluator
    ///
    /// Values computed here are not stored; rows are filled by `query_row`.
    pub fn query(&mut self, id: CacheId, i: usize, j: usize) -> f64 {
        match self.lookup(id, i, j) {
            Some(value) => {
                self.cache_mut(id).hits += 1;
                value
            }
            None => {
                self.cache_mut(id).misses += 1;
                self.evaluator.evaluate(i, j)
            }
        }
    }

    /// First `len` values of the row of example `i`, ordered by row position
    ///
    /// Missing values are computed, the row becomes the most recently used
    /// one, and older rows are purged if the budget is exceeded.
    pub fn query_row(&mut self, id: CacheId, i: usize, len: usize) -> &[f64] {
        let cache = self.cache_mut(id);
        let fetched = i < cache.capacity && cache.diag[i].is_some();
        if fetched && len <= cache.rows[i].len() {
            cache.unlink(i);
        } else {
            if i >= cache.capacity || len >= cache.capacity {
                cache.ensure_capacity((i + 1).max(len));
            }
            let old_len = if fetched {
                cache.rows[i].len()
            } else {
                let diag = self.query(id, i, i);
                self.cache_mut(id).diag[i] = Some(diag);
                0
            };
            if old_len < len {
                let mut values = Vec::with_capacity(len - old_len);
                for p in old_len..len {
                    let x = self.cache(id).r2i[p];
                    values.push(self.query(id, x, i));
                }
                self.cache_mut(id).extend_row(i, values);
            }
            let cache = self.cache_mut(id);
            cache.unlink(i);
            cache.purge();
        }
        let cache = self.cache_mut(id);
        cache.link_front(i);
        &cache.rows[i][..len]
    }

    /// Make sure ids below `n` are tracked and return the position table
    pub fn r2i(&mut self, id: CacheId, n: usize) -> &[usize] {
        let cache = self.cache_mut(id);
        cache.ensure_capacity(n);
        &cache.r2i
    }

    /// Exchange the example ids found at row positions `r1` and `r2`
    pub fn swap_rows(&mut self, id: CacheId, r1: usize, r2: usize) {
        let cache = self.cache_mut(id);
        cache.ensure_capacity(1 + r1.max(r2));
        let (i1, i2) = (cache.r2i[r1], cache.r2i[r2]);
        cache.swap(i1, i2, r1, r2);
    }

    /// Move example `i` to row position `r`
    pub fn swap_row_index(&mut self, id: CacheId, r: usize, i: usize) {
        let cache = self.cache_mut(id);
        cache.ensure_capacity(1 + r.max(i));
        let (i1, r2) = (cache.r2i[r], cache.i2r[i]);
        cache.swap(i1, i, r, r2);
    }

    pub fn stats(&self, id: CacheId) -> CacheStats {
        let cache = self.cache(id);
        CacheStats {
            hits: cache.hits,
            misses: cache.misses,
            rows: cache.rows.iter().filter(|row| !row.is_empty()).count(),
            current_size: cache.cur_size,
            max_size: cache.max_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Symmetric evaluator that counts its calls
    struct SpyEvaluator {
        calls: AtomicUsize,
    }

    impl SpyEvaluator {
        fn value(i: usize, j: usize) -> f64 {
            (i * j) as f64 + 0.5 * (i + j) as f64 + 1.0
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl KernelEvaluator for SpyEvaluator {
        fn evaluate(&self, i: usize, j: usize) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Self::value(i, j)
        }

        fn num_examples(&self) -> usize {
            1024
        }
    }

    fn pool() -> (Arc<SpyEvaluator>, KernelCachePool) {
        let spy = Arc::new(SpyEvaluator {
            calls: AtomicUsize::new(0),
        });
        let pool = KernelCachePool::new(spy.clone());
        (spy, pool)
    }

    fn assert_permutation(cache: &KernelCache) {
        for x in 0..cache.capacity() {
            assert_eq!(cache.r2i()[cache.i2r()[x]], x);
            assert_eq!(cache.i2r()[cache.r2i()[x]], x);
        }
    }

    fn assert_rows_consistent(cache: &KernelCache) {
        for i in 0..cache.capacity() {
            for p in 0..cache.row_len(i) {
                assert_eq!(
                    cache.rows[i][p],
                    SpyEvaluator::value(i, cache.r2i()[p]),
                    "row {} position {}",
                    i,
                    p
                );
            }
        }
    }

    #[test]
    fn test_query_is_not_memoized() {
        let (spy, mut pool) = pool();
        let id = pool.create(1 << 20);

        assert_eq!(pool.query(id, 3, 4), SpyEvaluator::value(3, 4));
        assert_eq!(pool.query(id, 3, 4), SpyEvaluator::value(3, 4));
        assert_eq!(spy.calls(), 2);
        assert_eq!(pool.stats(id).misses, 2);
    }

    #[test]
    fn test_query_row_memoizes() {
        let (spy, mut pool) = pool();
        let id = pool.create(1 << 20);

        let row = pool.query_row(id, 2, 5).to_vec();
        let expected: Vec<f64> = (0..5).map(|j| SpyEvaluator::value(2, j)).collect();
        assert_eq!(row, expected);
        let calls = spy.calls();

        // cached row, diagonal and symmetric entries
        assert_eq!(pool.query_row(id, 2, 5), expected.as_slice());
        assert_eq!(pool.query_row(id, 2, 3), &expected[..3]);
        assert_eq!(pool.query(id, 2, 4), SpyEvaluator::value(2, 4));
        assert_eq!(pool.query(id, 4, 2), SpyEvaluator::value(4, 2));
        assert_eq!(pool.query(id, 2, 2), SpyEvaluator::value(2, 2));
        assert_eq!(spy.calls(), calls);
        assert!(pool.stats(id).hit_rate() > 0.0);
    }

    #[test]
    fn test_query_row_extends() {
        let (spy, mut pool) = pool();
        let id = pool.create(1 << 20);

        pool.query_row(id, 10, 3);
        let calls = spy.calls();
        let row = pool.query_row(id, 10, 6).to_vec();

        assert_eq!(spy.calls(), calls + 3);
        assert_eq!(row[5], SpyEvaluator::value(10, 5));
        assert_eq!(pool.cache(id).row_len(10), 6);
    }

    #[test]
    fn test_capacity_growth() {
        let (_, mut pool) = pool();
        let id = pool.create(1 << 20);

        pool.query_row(id, 0, 2);
        assert_eq!(pool.cache(id).capacity(), 256);
        pool.query_row(id, 600, 2);
        assert_eq!(pool.cache(id).capacity(), 1024);
        assert_permutation(pool.cache(id));
        assert_eq!(pool.query_row(id, 0, 2)[1], SpyEvaluator::value(0, 1));
    }

    #[test]
    fn test_lru_eviction() {
        let (_, mut pool) = pool();
        let row_bytes = 4 * size_of::<f64>();
        let id = pool.create(2 * row_bytes);

        pool.query_row(id, 0, 4);
        pool.query_row(id, 1, 4);
        pool.query_row(id, 2, 4);
        assert_eq!(pool.cache(id).row_len(0), 0);
        assert_eq!(pool.cache(id).row_len(1), 4);
        assert_eq!(pool.cache(id).row_len(2), 4);

        // touching row 1 makes row 2 the oldest
        pool.query_row(id, 1, 4);
        pool.query_row(id, 3, 4);
        assert_eq!(pool.cache(id).row_len(2), 0);
        assert_eq!(pool.cache(id).row_len(1), 4);
        assert_eq!(pool.cache(id).row_len(3), 4);
        assert!(pool.cache(id).current_size() <= pool.cache(id).max_size());
    }

    #[test]
    fn test_budget_holds_after_every_operation() {
        let (_, mut pool) = pool();
        let id = pool.create(40 * size_of::<f64>());
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..300 {
            match rng.gen_range(0..3) {
                0 => {
                    let i = rng.gen_range(0..30);
                    let len = rng.gen_range(1..12);
                    pool.query_row(id, i, len);
                }
                1 => pool.swap_rows(id, rng.gen_range(0..12), rng.gen_range(0..12)),
                _ => pool.swap_row_index(id, rng.gen_range(0..12), rng.gen_range(0..30)),
            }
            let cache = pool.cache(id);
            assert!(cache.current_size() <= cache.max_size());
        }
        // a budget smaller than the newest row keeps that row and nothing else
        pool.query_row(id, 5, 11);
        pool.set_max_size(id, 8 * size_of::<f64>());
        let cache = pool.cache(id);
        assert_eq!(cache.row_len(5), 11);
        assert_eq!(cache.current_size(), 11 * size_of::<f64>());
        assert_eq!(pool.stats(id).rows, 1);

        // the row being fetched and the previous newest row both survive
        pool.query_row(id, 6, 4);
        assert_eq!(pool.cache(id).row_len(5), 11);
        assert_eq!(pool.cache(id).row_len(6), 4);
        assert_eq!(pool.stats(id).rows, 2);

        // the oldest row goes as soon as it is no longer the newest
        pool.query_row(id, 7, 4);
        let cache = pool.cache(id);
        assert_eq!(cache.row_len(5), 0);
        assert_eq!(cache.row_len(6), 4);
        assert_eq!(cache.row_len(7), 4);
        assert_eq!(cache.current_size(), cache.max_size());
        assert_eq!(pool.stats(id).rows, 2);
    }

    #[test]
    fn test_swaps_keep_rows_consistent() {
        let (spy, mut pool) = pool();
        let id = pool.create(1 << 20);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..500 {
            match rng.gen_range(0..3) {
                0 => {
                    let i = rng.gen_range(0..40);
                    let len = rng.gen_range(0..20);
                    let row = pool.query_row(id, i, len).to_vec();
                    let r2i = pool.cache(id).r2i().to_vec();
                    for (p, value) in row.iter().enumerate() {
                        assert_eq!(*value, SpyEvaluator::value(i, r2i[p]));
                    }
                }
                1 => pool.swap_rows(id, rng.gen_range(0..20), rng.gen_range(0..20)),
                _ => pool.swap_row_index(id, rng.gen_range(0..20), rng.gen_range(0..40)),
            }
            assert_permutation(pool.cache(id));
            assert_rows_consistent(pool.cache(id));
        }

        for i in 0..40 {
            for j in 0..40 {
                assert_eq!(pool.query(id, i, j), SpyEvaluator::value(i, j));
            }
        }
        // memoization never costs more than evaluating every request directly
        assert!(spy.calls() > 0);
    }

    #[test]
    fn test_swap_row_index_moves_example() {
        let (_, mut pool) = pool();
        let id = pool.create(1 << 20);

        pool.query_row(id, 7, 4);
        pool.swap_row_index(id, 0, 7);

        let cache = pool.cache(id);
        assert_eq!(cache.r2i()[0], 7);
        assert_eq!(cache.position(7), 0);
        assert_eq!(cache.position(0), 7);
        assert_eq!(cache.position(5000), 5000);
        assert_rows_consistent(cache);
    }

    #[test]
    fn test_buddy_ring() {
        let (_, mut pool) = pool();
        let a = pool.create(1 << 20);
        let b = pool.create(1 << 20);
        let c = pool.create(1 << 20);

        pool.set_buddy(a, b);
        pool.set_buddy(a, c);
        pool.set_buddy(a, b);
        let mut ring = pool.buddies(a);
        ring.sort_unstable();
        assert_eq!(ring, vec![a, b, c]);
        assert_eq!(pool.buddies(b).len(), 3);

        pool.destroy(b);
        assert_eq!(pool.buddies(a).len(), 2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.create(1024), b);
    }

    #[test]
    fn test_buddy_lookup_avoids_evaluator() {
        let (spy, mut pool) = pool();
        let a = pool.create(1 << 20);
        let b = pool.create(1 << 20);
        let c = pool.create(1 << 20);
        pool.set_buddy(a, b);
        pool.set_buddy(a, c);

        pool.query_row(b, 5, 8);
        let calls = spy.calls();

        assert_eq!(pool.query(c, 5, 7), SpyEvaluator::value(5, 7));
        assert_eq!(pool.query(c, 7, 5), SpyEvaluator::value(7, 5));
        assert_eq!(pool.query(a, 5, 5), SpyEvaluator::value(5, 5));
        assert_eq!(spy.calls(), calls);

        pool.destroy(b);
        pool.query(c, 5, 7);
        assert_eq!(spy.calls(), calls + 1);
    }
}
