//! Stochastic weight model consulted when choosing the next transition.

pub mod estimate;
pub mod map;
pub mod weight;

use thiserror::Error;

use crate::net::TransitionId;

pub use estimate::{FrequencyEstimator, WeightEstimator};
pub use map::{Choice, MissingWeight, StochasticMap, WeightFile};
pub use weight::{Distribution, FlatWeight, Likelihood, TimedDistribution, WeightDescriptor};

#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("weight must be finite and non-negative, got {0}")]
    InvalidWeight(f64),
    #[error("invalid delay distribution: {0}")]
    InvalidDistribution(String),
    #[error("invalid weight for {0}: {1}")]
    Entry(Choice, Box<WeightError>),
    #[error("no weight for {0} and missing weights are rejected")]
    Missing(Choice),
    #[error("weight given for transition {0:?}, which is not part of the net")]
    UnknownTransition(TransitionId),
    #[error("weight given for unknown transition name '{0}'")]
    UnknownTransitionName(String),
    #[error("reference log is empty")]
    EmptyReferenceLog,
}
