//! Probability vectors over route segments and their fusion.

use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Non-negative weights over the N + 1 segments of a journey, summing to 1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution(Vec<f64>);

impl Distribution {
    /// Builds a distribution from raw non-negative masses by linear
    /// normalisation. A vector with no usable mass becomes uniform.
    #[must_use]
    pub fn normalized(mut masses: Vec<f64>) -> Self {
        for mass in &mut masses {
            if !mass.is_finite() || *mass < 0.0 {
                *mass = 0.0;
            }
        }

        let total: f64 = masses.iter().sum();
        if total > 0.0 {
            for mass in &mut masses {
                *mass /= total;
            }
        } else if !masses.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let uniform = 1.0 / masses.len() as f64;
            masses.fill(uniform);
        }
        Self(masses)
    }

    /// Wraps values that already form a distribution, without rescaling.
    #[must_use]
    pub(crate) const fn exact(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Index of the most probable segment; the lowest index wins ties.
    #[must_use]
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (index, value) in self.0.iter().enumerate() {
            if *value > self.0[best] {
                best = index;
            }
        }
        best
    }

    /// Number of segments carrying any mass.
    #[must_use]
    pub fn support(&self) -> usize {
        self.0.iter().filter(|value| **value > 0.0).count()
    }
}

impl Index<usize> for Distribution {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Weighted linear combination of equally sized distributions.
///
/// Missing weights count as zero and vectors are truncated to the shortest
/// length. The result is renormalised.
#[must_use]
pub fn combine(vectors: &[&Distribution], weights: &[f64]) -> Distribution {
    let len = vectors.iter().map(|vector| vector.len()).min().unwrap_or(0);
    let mut combined = vec![0.0; len];

    for (vector, weight) in vectors.iter().zip(weights) {
        for (slot, value) in combined.iter_mut().zip(vector.values()) {
            *slot += weight * value;
        }
    }

    Distribution::normalized(combined)
}
