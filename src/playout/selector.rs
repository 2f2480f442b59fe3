//! Weighted choice among enabled transitions and the stop option.
use rand::Rng;

use crate::net::TransitionId;
use crate::stochastic::{Choice, StochasticMap};

#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
    weights: &'a StochasticMap,
}

impl<'a> Selector<'a> {
    pub fn new(weights: &'a StochasticMap) -> Self {
        Self { weights }
    }

    /// Enabled transitions in the given order, then `Stop` when the final marking is reached.
    pub fn candidates(enabled: &[TransitionId], at_final_marking: bool) -> Vec<Choice> {
        let mut candidates = Vec::with_capacity(enabled.len() + 1);
        candidates.extend(enabled.iter().copied().map(Choice::Transition));
        if at_final_marking {
            candidates.push(Choice::Stop);
        }
        candidates
    }

    /// Picks one candidate with probability proportional to its weight.
    ///
    /// The draw `u ∈ [0, total)` lands in the interval of the first candidate whose
    /// cumulative weight exceeds it, so the result depends on candidate order. When every
    /// candidate weighs zero the pick is uniform. A single candidate is returned without
    /// consuming randomness.
    pub fn select<R: Rng>(&self, candidates: &[Choice], rng: &mut R) -> Option<Choice> {
        match candidates {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }

        let mut weights: Vec<f64> = candidates
            .iter()
            .map(|choice| self.weights.weight(*choice))
            .collect();
        let heaviest = weights.iter().copied().fold(0.0, f64::max);
        if heaviest <= 0.0 {
            return Some(candidates[rng.random_range(0..candidates.len())]);
        }
        // Scaled into [0, 1] so the total stays finite for weights near f64::MAX.
        for weight in &mut weights {
            *weight /= heaviest;
        }
        let total: f64 = weights.iter().sum();

        let draw = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        for (choice, weight) in candidates.iter().zip(&weights) {
            cumulative += weight;
            if draw < cumulative {
                return Some(*choice);
            }
        }
        // Rounding can leave `draw` just past the last boundary.
        candidates
            .iter()
            .zip(&weights)
            .rev()
            .find(|(_, weight)| **weight > 0.0)
            .map(|(choice, _)| *choice)
    }
}
