//! Random batch selection for a review session.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::estimate::get_optimal_study_limit;
use crate::types::WordProgress;

/// Words drawn for one session. Membership and order are fixed once sampled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionBatch {
    items: Vec<WordProgress>,
}

impl SessionBatch {
    /// Draw up to `cap` words from `pool` uniformly at random, without replacement.
    pub fn sample<R: Rng + ?Sized>(pool: &[WordProgress], cap: usize, rng: &mut R) -> Self {
        let size = get_optimal_study_limit(cap, pool.len());
        let mut items = pool.to_vec();
        items.shuffle(rng);
        items.truncate(size);
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordProgress> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[WordProgress] {
        &self.items
    }
}
