//! Weighted random choice over a fixed set of values.
//!
//! Used for chance nodes: each child is stored under its cumulative
//! probability and a uniform draw in `[0, 1)` picks the first entry whose
//! cumulative key exceeds it.

use rand::Rng;

/// Cumulative-probability table built once from `(value, weight)` pairs.
///
/// Weights are not required to sum to one. Draws beyond the last cumulative
/// key (weights summing to less than one, or rounding at the top end) fall
/// back to the last entry, so sampling never fails on a non-empty table.
#[derive(Clone, Debug)]
pub struct WeightedTable<V> {
    /// Strictly increasing running sums of the accepted weights.
    cumulative: Vec<f64>,
    values: Vec<V>,
}

impl<V> WeightedTable<V> {
    /// Build a table, skipping entries whose weight is not strictly positive.
    pub fn new<I>(weighted: I) -> Self
    where
        I: IntoIterator<Item = (V, f64)>,
    {
        let mut cumulative = Vec::new();
        let mut values = Vec::new();
        let mut total = 0.0;

        for (value, weight) in weighted {
            // Also rejects NaN.
            if !(weight > 0.0) {
                continue;
            }
            total += weight;
            cumulative.push(total);
            values.push(value);
        }

        Self { cumulative, values }
    }

    /// Draw one value. Returns `None` only if the table is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&V> {
        let last = self.values.last()?;
        let draw: f64 = rng.gen();

        // First entry whose cumulative key is strictly greater than the draw.
        let idx = self.cumulative.partition_point(|&key| key <= draw);
        Some(self.values.get(idx).unwrap_or(last))
    }

    /// Sum of all accepted weights (the largest cumulative key).
    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// The stored values, in insertion order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Weight originally given to the value at `index`.
    pub fn weight(&self, index: usize) -> Option<f64> {
        let upper = *self.cumulative.get(index)?;
        let lower = if index == 0 { 0.0 } else { self.cumulative[index - 1] };
        Some(upper - lower)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
