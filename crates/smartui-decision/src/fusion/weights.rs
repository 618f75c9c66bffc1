//! Adaptive category weights
//!
//! The weight vector always sums to 1.0. Every adaptation is a single
//! read-modify-normalize step performed under the [`SharedWeights`] mutex.

use parking_lot::Mutex;
use serde::Serialize;
use smartui_common::Category;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::DecisionConfig;

/// Weights shared by every decision cycle
pub type SharedWeights = Arc<Mutex<CategoryWeights>>;

/// How fused confidence moves the primary category's weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptationPolicy {
    pub boost_threshold: f64,
    pub decay_threshold: f64,
    pub boost_factor: f64,
    pub decay_factor: f64,
}

impl Default for AdaptationPolicy {
    fn default() -> Self {
        Self::from(&DecisionConfig::default())
    }
}

impl From<&DecisionConfig> for AdaptationPolicy {
    fn from(config: &DecisionConfig) -> Self {
        Self {
            boost_threshold: config.boost_threshold,
            decay_threshold: config.decay_threshold,
            boost_factor: config.boost_factor,
            decay_factor: config.decay_factor,
        }
    }
}

/// Normalized weight per category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryWeights {
    weights: BTreeMap<Category, f64>,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::equal()
    }
}

impl CategoryWeights {
    /// Equal weight for every category
    pub fn equal() -> Self {
        let share = 1.0 / Category::ALL.len() as f64;
        Self {
            weights: Category::ALL.iter().map(|c| (*c, share)).collect(),
        }
    }

    /// Build from configured values; missing or invalid entries take an equal share
    pub fn from_map(values: &BTreeMap<Category, f64>) -> Self {
        let share = 1.0 / Category::ALL.len() as f64;
        let mut weights = Self {
            weights: Category::ALL
                .iter()
                .map(|c| {
                    let value = values
                        .get(c)
                        .copied()
                        .filter(|w| w.is_finite() && *w > 0.0)
                        .unwrap_or(share);
                    (*c, value)
                })
                .collect(),
        };
        weights.normalize();
        weights
    }

    pub fn shared(self) -> SharedWeights {
        Arc::new(Mutex::new(self))
    }

    pub fn get(&self, category: Category) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }

    pub fn as_map(&self) -> &BTreeMap<Category, f64> {
        &self.weights
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Scale the category by the policy factor for `confidence`, then renormalize.
    ///
    /// Returns the factor applied (1.0 when confidence is in the neutral band).
    pub fn adapt(&mut self, category: Category, confidence: f64, policy: &AdaptationPolicy) -> f64 {
        let factor = if confidence >= policy.boost_threshold {
            policy.boost_factor
        } else if confidence < policy.decay_threshold {
            policy.decay_factor
        } else {
            return 1.0;
        };

        if let Some(weight) = self.weights.get_mut(&category) {
            *weight *= factor;
        }
        self.normalize();
        factor
    }

    fn normalize(&mut self) {
        let total = self.sum();
        if !total.is_finite() || total <= 0.0 {
            *self = Self::equal();
            return;
        }
        for weight in self.weights.values_mut() {
            *weight /= total;
        }
    }
}
