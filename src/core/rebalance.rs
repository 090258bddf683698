//! Subject-level upsampling of the minority class.
//!
//! For every child with minority-class (NT) rows, a couple of that child's
//! rows are duplicated at the end of the table. Children with few rows are
//! sampled without replacement, children with many rows with replacement.
//! The random source is injected so runs are reproducible from a seed.

use crate::core::expansion::OutputRow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Number of duplicated rows drawn per minority-class subject.
pub const DUPLICATES_PER_SUBJECT: usize = 2;

/// Subjects with at most this many rows are sampled without replacement.
pub const WITHOUT_REPLACEMENT_LIMIT: usize = 10;

/// Map each `child_id` to the positions of its rows, in table order.
pub fn subject_index(rows: &[OutputRow]) -> BTreeMap<&str, Vec<usize>> {
    let mut index: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        index.entry(row.child_id.as_str()).or_default().push(i);
    }
    index
}

/// Pick which of a subject's rows get duplicated.
///
/// Up to [`WITHOUT_REPLACEMENT_LIMIT`] rows: `min(k, 2)` distinct rows.
/// Above that: 2 rows drawn with replacement.
pub fn sample_duplicates<R: Rng + ?Sized>(positions: &[usize], rng: &mut R) -> Vec<usize> {
    let k = positions.len();
    if k == 0 {
        return Vec::new();
    }

    if k <= WITHOUT_REPLACEMENT_LIMIT {
        let amount = k.min(DUPLICATES_PER_SUBJECT);
        rand::seq::index::sample(rng, k, amount)
            .into_iter()
            .map(|i| positions[i])
            .collect()
    } else {
        (0..DUPLICATES_PER_SUBJECT)
            .map(|_| positions[rng.random_range(0..k)])
            .collect()
    }
}

/// Upsamples minority-class subjects of a row table.
pub struct Rebalancer<R> {
    rng: R,
}

impl Rebalancer<StdRng> {
    /// Rebalancer driven by a seeded standard RNG.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Rebalancer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Positions of the rows to duplicate, grouped by subject in `child_id` order.
    pub fn plan(&mut self, rows: &[OutputRow]) -> Vec<usize> {
        let index = subject_index(rows);
        let mut duplicates = Vec::new();

        for (child_id, positions) in &index {
            let has_minority = positions.iter().any(|&i| rows[i].label.is_minority());
            if !has_minority {
                continue;
            }

            let picked = sample_duplicates(positions, &mut self.rng);
            tracing::debug!(
                child_id = %child_id,
                rows = positions.len(),
                duplicated = picked.len(),
                "Upsampled subject"
            );
            duplicates.extend(picked);
        }

        duplicates
    }

    /// Return the table with the duplicated rows appended after the originals.
    pub fn upsample(&mut self, rows: Vec<OutputRow>) -> Vec<OutputRow> {
        let plan = self.plan(&rows);
        let duplicates: Vec<OutputRow> = plan.iter().map(|&i| rows[i].clone()).collect();

        let mut augmented = rows;
        augmented.extend(duplicates);
        augmented
    }
}
