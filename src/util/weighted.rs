//! Weighted random choice over a fixed set of outcomes.
//!
//! Used for power-up types and brick strength tiers. Weights are
//! probabilities and must sum to 1.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use thiserror::Error;

/// Tolerance applied when checking that weights sum to 1
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("weighted table has no entries")]
    Empty,
    #[error("weight {0} is negative or not finite")]
    InvalidWeight(f64),
    #[error("weights sum to {0}, expected 1")]
    BadSum(f64),
}

/// Immutable table of `(outcome, probability)` pairs
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    outcomes: Vec<T>,
    weights: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl<T: Clone> WeightedTable<T> {
    pub fn new(entries: impl IntoIterator<Item = (T, f64)>) -> Result<Self, WeightError> {
        let (outcomes, weights): (Vec<T>, Vec<f64>) = entries.into_iter().unzip();
        if outcomes.is_empty() {
            return Err(WeightError::Empty);
        }
        if let Some(&bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(WeightError::InvalidWeight(bad));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::BadSum(sum));
        }
        // Only fails on all-zero weights, which the sum check already excludes
        let index = WeightedIndex::new(&weights).map_err(|_| WeightError::BadSum(sum))?;
        Ok(Self {
            outcomes,
            weights,
            index,
        })
    }

    /// Draw one outcome
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.outcomes[self.index.sample(rng)].clone()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Probability assigned to each outcome, in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&T, f64)> {
        self.outcomes.iter().zip(self.weights.iter().copied())
    }
}
