//! Dual state of one output class

use crate::cache::{CacheId, KernelCachePool};

/// Coefficients below this magnitude count as zero during cleanup
pub const BETA_EPSILON: f64 = f32::EPSILON as f64;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Dual coefficients and gradients of one class
///
/// Row `r` of `beta` and `g` belongs to the example found at position `r`
/// of the class's kernel cache, so the support vectors of the class are the
/// first `len()` entries of the cache's `r2i` table.
#[derive(Debug)]
pub struct PerClassOutput {
    cache: CacheId,
    beta: Vec<f64>,
    g: Vec<f64>,
}

impl PerClassOutput {
    /// Create the output together with its kernel cache
    pub fn new(pool: &mut KernelCachePool, cache_size: usize) -> Self {
        Self {
            cache: pool.create(cache_size),
            beta: Vec::new(),
            g: Vec::new(),
        }
    }

    pub fn cache_id(&self) -> CacheId {
        self.cache
    }

    /// Number of rows (tracked support vectors)
    pub fn len(&self) -> usize {
        self.beta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beta.is_empty()
    }

    pub fn betas(&self) -> &[f64] {
        &self.beta
    }

    pub fn gradients(&self) -> &[f64] {
        &self.g
    }

    fn row_of(&self, pool: &KernelCachePool, x_id: usize) -> Option<usize> {
        let row = pool.cache(self.cache).position(x_id);
        (row < self.len()).then_some(row)
    }

    /// Class output `sum_r beta_r * K(r2i[r], x)`
    pub fn compute_score(&self, pool: &mut KernelCachePool, x_id: usize) -> f64 {
        if self.beta.is_empty() {
            return 0.0;
        }
        let row = pool.query_row(self.cache, x_id, self.len());
        dot(&self.beta, row)
    }

    pub fn compute_gradient(
        &self,
        pool: &mut KernelCachePool,
        x_id: usize,
        true_label: i32,
        this_label: i32,
    ) -> f64 {
        let target = if true_label == this_label { 1.0 } else { 0.0 };
        target - self.compute_score(pool, x_id)
    }

    pub fn get_kii(&self, pool: &mut KernelCachePool, x_id: usize) -> f64 {
        pool.query(self.cache, x_id, x_id)
    }

    pub fn get_beta(&self, pool: &KernelCachePool, x_id: usize) -> f64 {
        self.row_of(pool, x_id).map_or(0.0, |row| self.beta[row])
    }

    /// Stored gradient of `x_id`, 0 when it has no row
    pub fn get_gradient(&self, pool: &KernelCachePool, x_id: usize) -> f64 {
        self.row_of(pool, x_id).map_or(0.0, |row| self.g[row])
    }

    pub fn is_support_vector(&self, pool: &KernelCachePool, x_id: usize) -> bool {
        self.row_of(pool, x_id).is_some()
    }

    /// Add `lambda` to the coefficient of `x_id`
    ///
    /// An example without a row is moved to the first free position and
    /// starts with gradient `gp`. The stored gradients of every row are then
    /// decreased by `lambda * K(x_id, row)`.
    pub fn update(&mut self, pool: &mut KernelCachePool, x_id: usize, lambda: f64, gp: f64) {
        match self.row_of(pool, x_id) {
            Some(row) => self.beta[row] += lambda,
            None => {
                pool.swap_row_index(self.cache, self.len(), x_id);
                self.g.push(gp);
                self.beta.push(lambda);
            }
        }

        let row = pool.query_row(self.cache, x_id, self.len());
        for (g, k) in self.g.iter_mut().zip(row) {
            *g -= lambda * k;
        }
    }

    /// Drop rows whose coefficient is numerically zero
    ///
    /// Remaining rows keep their relative order. Returns the number of rows
    /// removed.
    pub fn cleanup(&mut self, pool: &mut KernelCachePool) -> usize {
        let len = self.len();
        let mut kept = 0;
        for r in 0..len {
            if self.beta[r].abs() < BETA_EPSILON {
                continue;
            }
            if kept != r {
                pool.swap_rows(self.cache, kept, r);
                self.beta[kept] = self.beta[r];
                self.g[kept] = self.g[r];
            }
            kept += 1;
        }
        self.beta.truncate(kept);
        self.g.truncate(kept);
        len - kept
    }

    /// Squared norm of the class weight vector, `sum_r beta_r * <beta, K_r>`
    pub fn w2(&self, pool: &mut KernelCachePool) -> f64 {
        let ids = self.support_vectors(pool);
        let mut sum = 0.0;
        for (r, &x_id) in ids.iter().enumerate() {
            let row = pool.query_row(self.cache, x_id, self.len());
            sum += self.beta[r] * dot(&self.beta, row);
        }
        sum
    }

    /// Example ids of every row, whatever the coefficient
    pub fn support_vectors(&self, pool: &KernelCachePool) -> Vec<usize> {
        pool.cache(self.cache).r2i()[..self.len()].to_vec()
    }

    /// Release the kernel cache of this output
    pub fn destroy(self, pool: &mut KernelCachePool) {
        pool.destroy(self.cache);
    }
}
